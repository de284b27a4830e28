use crate::database::models::CommentRecord;
use crate::database::repositories::{CommentRepository, PostRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentService {
    database: Database,
}

impl CommentService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn list_comments(&self, post_id: &str) -> Result<Vec<CommentView>> {
        self.database.with_repositories(|repos| {
            let comments = repos.comments().list_for_post(post_id)?;
            Ok(comments.into_iter().map(CommentView::from_record).collect())
        })
    }

    pub fn create_comment(&self, input: CreateCommentInput) -> Result<CommentView> {
        if input.author_name.trim().is_empty() {
            anyhow::bail!("comment author name may not be empty");
        }
        if input.content.trim().is_empty() {
            anyhow::bail!("comment content may not be empty");
        }

        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            post_id: input.post_id.clone(),
            author_name: input.author_name,
            content: input.content,
            created_at: now_utc_iso(),
        };

        self.database.with_repositories(|repos| {
            if repos.posts().get(&record.post_id)?.is_none() {
                anyhow::bail!("post not found");
            }
            repos.comments().create(&record)?;
            Ok(())
        })?;

        Ok(CommentView::from_record(record))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: String,
}

impl CommentView {
    fn from_record(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            post_id: record.post_id,
            author_name: record.author_name,
            content: record.content,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    pub post_id: String,
    pub author_name: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posting::{CreatePostInput, PostService};
    use rusqlite::Connection;

    fn setup() -> (PostService, CommentService) {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        (
            PostService::new(db.clone(), "Sungsoo Yang"),
            CommentService::new(db),
        )
    }

    fn comment(post_id: &str, author: &str, content: &str) -> CreateCommentInput {
        CreateCommentInput {
            post_id: post_id.into(),
            author_name: author.into(),
            content: content.into(),
        }
    }

    #[test]
    fn comments_attach_to_existing_posts() {
        let (posts, comments) = setup();
        let post = posts
            .create_post(CreatePostInput {
                title: "Hello".into(),
                content: "Body".into(),
                category: "Infra".into(),
                image_url: None,
            })
            .unwrap();

        let created = comments
            .create_comment(comment(&post.id, "reader", "nice post"))
            .unwrap();
        assert_eq!(created.post_id, post.id);

        let listed = comments.list_comments(&post.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "nice post");

        assert!(comments
            .create_comment(comment("missing", "reader", "hello"))
            .is_err());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let (_, comments) = setup();
        assert!(comments
            .create_comment(comment("post-1", "  ", "content"))
            .is_err());
        assert!(comments
            .create_comment(comment("post-1", "reader", "\t"))
            .is_err());
    }
}

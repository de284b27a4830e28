use crate::database::models::PostRecord;
use crate::database::repositories::PostRepository;
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

/// Category label meaning "apply no filter".
pub const WILDCARD_CATEGORY: &str = "All";

pub const EXCERPT_MAX_CHARS: usize = 150;

#[derive(Clone)]
pub struct PostService {
    database: Database,
    author_name: String,
}

impl PostService {
    pub fn new(database: Database, author_name: impl Into<String>) -> Self {
        Self {
            database,
            author_name: author_name.into(),
        }
    }

    pub fn list_posts(
        &self,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<PostView>> {
        let category = category.filter(|c| *c != WILDCARD_CATEGORY);
        self.database.with_repositories(|repos| {
            let posts = repos.posts().list_published(category, limit)?;
            Ok(posts.into_iter().map(PostView::from_record).collect())
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostView>> {
        self.database.with_repositories(|repos| {
            Ok(repos.posts().get(id)?.map(PostView::from_record))
        })
    }

    pub fn create_post(&self, input: CreatePostInput) -> Result<PostView> {
        if input.title.trim().is_empty() {
            anyhow::bail!("post title may not be empty");
        }
        if input.content.trim().is_empty() {
            anyhow::bail!("post content may not be empty");
        }
        if input.category.trim().is_empty() {
            anyhow::bail!("post category may not be empty");
        }

        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            excerpt: Some(derive_excerpt(&input.content)),
            content: input.content,
            category: input.category,
            image_url: input.image_url.filter(|url| !url.trim().is_empty()),
            author: self.author_name.clone(),
            created_at: now_utc_iso(),
            published: true,
            views: 0,
        };

        self.database.with_repositories(|repos| {
            repos.posts().create(&record)?;
            Ok(())
        })?;

        Ok(PostView::from_record(record))
    }

    /// Atomic counter bump. Returns false when the post does not exist.
    pub fn increment_views(&self, id: &str) -> Result<bool> {
        self.database
            .with_repositories(|repos| repos.posts().increment_views(id))
    }

    /// Direct counter write used by the client's read-then-write fallback.
    pub fn set_views(&self, id: &str, views: i64) -> Result<bool> {
        if views < 0 {
            anyhow::bail!("view count may not be negative");
        }
        self.database
            .with_repositories(|repos| repos.posts().set_views(id, views))
    }
}

/// Plain-text summary of the markdown, computed once when the post is
/// created. Strips emphasis/heading/link-bracket characters, collapses
/// blank-line runs, and truncates to 150 characters with a `...` marker.
pub fn derive_excerpt(content: &str) -> String {
    let stripped: String = content
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '`' | '[' | ']' | '(' | ')'))
        .collect();
    let collapsed = blank_run_pattern().replace_all(&stripped, " ");
    let plain = collapsed.trim();

    let truncated: String = plain.chars().take(EXCERPT_MAX_CHARS).collect();
    if plain.chars().count() > EXCERPT_MAX_CHARS {
        format!("{truncated}...")
    } else {
        truncated
    }
}

fn blank_run_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n{2,}").expect("static pattern"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub author: String,
    pub created_at: String,
    pub published: bool,
    pub views: i64,
}

impl PostView {
    fn from_record(record: PostRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            category: record.category,
            excerpt: record.excerpt,
            image_url: record.image_url,
            author: record.author,
            created_at: record.created_at,
            published: record.published,
            views: record.views,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_service() -> PostService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        PostService::new(db, "Sungsoo Yang")
    }

    fn sample_input(title: &str, category: &str) -> CreatePostInput {
        CreatePostInput {
            title: title.into(),
            content: "Some body text.".into(),
            category: category.into(),
            image_url: None,
        }
    }

    #[test]
    fn excerpt_strips_markup_and_collapses_blank_lines() {
        let excerpt = derive_excerpt("# Title\n\nSome **bold** text.");
        assert_eq!(excerpt, "Title Some bold text.");
    }

    #[test]
    fn excerpt_truncates_long_content_with_marker() {
        let long = "word ".repeat(60);
        let excerpt = derive_excerpt(&long);
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS + 3);
        assert!(excerpt.ends_with("..."));

        let exact: String = "x".repeat(EXCERPT_MAX_CHARS);
        assert_eq!(derive_excerpt(&exact), exact);
    }

    #[test]
    fn created_posts_are_published_with_zero_views() {
        let service = setup_service();
        let post = service.create_post(sample_input("Hello", "Infra")).unwrap();

        assert!(post.published);
        assert_eq!(post.views, 0);
        assert_eq!(post.author, "Sungsoo Yang");
        assert_eq!(post.excerpt.as_deref(), Some("Some body text."));

        let fetched = service.get_post(&post.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Hello");
    }

    #[test]
    fn create_rejects_blank_fields() {
        let service = setup_service();
        assert!(service.create_post(sample_input("  ", "Infra")).is_err());
        assert!(service.create_post(sample_input("Hello", "  ")).is_err());
        let mut input = sample_input("Hello", "Infra");
        input.content = "\n".into();
        assert!(service.create_post(input).is_err());
    }

    #[test]
    fn wildcard_category_applies_no_filter() {
        let service = setup_service();
        service.create_post(sample_input("One", "Infra")).unwrap();
        service.create_post(sample_input("Two", "Nest")).unwrap();

        assert_eq!(service.list_posts(Some("All"), None).unwrap().len(), 2);
        assert_eq!(service.list_posts(None, None).unwrap().len(), 2);
        let filtered = service.list_posts(Some("Nest"), None).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Two");
    }

    #[test]
    fn view_counter_paths() {
        let service = setup_service();
        let post = service.create_post(sample_input("Hello", "Infra")).unwrap();

        assert!(service.increment_views(&post.id).unwrap());
        assert_eq!(service.get_post(&post.id).unwrap().unwrap().views, 1);

        assert!(service.set_views(&post.id, 5).unwrap());
        assert_eq!(service.get_post(&post.id).unwrap().unwrap().views, 5);

        assert!(!service.increment_views("missing").unwrap());
        assert!(service.set_views(&post.id, -1).is_err());
    }
}

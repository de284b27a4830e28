use crate::database::models::PostRecord;
use anyhow::Result;
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_post_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        excerpt: row.get(4)?,
        image_url: row.get(5)?,
        author: row.get(6)?,
        created_at: row.get(7)?,
        published: row.get(8)?,
        views: row.get(9)?,
    })
}

const POST_COLUMNS: &str =
    "id, title, content, category, excerpt, image_url, author, created_at, published, views";

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, title, content, category, excerpt, image_url, author, created_at, published, views)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.id,
                record.title,
                record.content,
                record.category,
                record.excerpt,
                record.image_url,
                record.author,
                record.created_at,
                record.published,
                record.views
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                map_post_row,
            )
            .optional()?)
    }

    fn list_published(
        &self,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<PostRecord>> {
        let mut sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE published = 1");
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(category) = category {
            sql.push_str(&format!(" AND category = ?{}", args.len() + 1));
            args.push(Box::new(category.to_string()));
        }
        sql.push_str(" ORDER BY datetime(created_at) DESC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT ?{}", args.len() + 1));
            args.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(args.iter().map(|arg| arg.as_ref())),
            map_post_row,
        )?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    fn increment_views(&self, id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE posts SET views = views + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(changed > 0)
    }

    fn set_views(&self, id: &str, views: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE posts SET views = ?1 WHERE id = ?2",
            params![views, id],
        )?;
        Ok(changed > 0)
    }
}

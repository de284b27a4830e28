mod comments;
mod images;
mod posts;

use super::models::{CommentRecord, ImageRecord, PostRecord};
use anyhow::Result;
use rusqlite::Connection;

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    /// Published posts only, newest-created-first. `category` filters by
    /// exact label; `limit` caps the result server-side.
    fn list_published(
        &self,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<PostRecord>>;
    /// Atomic `views = views + 1`. Returns false when no row matched.
    fn increment_views(&self, id: &str) -> Result<bool>;
    /// Direct write backing the read-then-write fallback path.
    fn set_views(&self, id: &str, views: i64) -> Result<bool>;
}

pub trait CommentRepository {
    fn create(&self, record: &CommentRecord) -> Result<()>;
    /// Newest-first by creation time.
    fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>>;
}

pub trait ImageRepository {
    fn attach(&self, record: &ImageRecord) -> Result<()>;
    fn get_by_stored_name(&self, stored_name: &str) -> Result<Option<ImageRecord>>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn images(&self) -> impl ImageRepository + '_ {
        images::SqliteImageRepository { conn: self.conn }
    }
}

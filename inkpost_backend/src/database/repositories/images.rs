use crate::database::models::ImageRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteImageRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::ImageRepository for SqliteImageRepository<'conn> {
    fn attach(&self, record: &ImageRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO images (id, stored_name, original_name, mime, size_bytes, checksum, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.stored_name,
                record.original_name,
                record.mime,
                record.size_bytes,
                record.checksum,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get_by_stored_name(&self, stored_name: &str) -> Result<Option<ImageRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, stored_name, original_name, mime, size_bytes, checksum, created_at
                FROM images
                WHERE stored_name = ?1
                "#,
                params![stored_name],
                |row| {
                    Ok(ImageRecord {
                        id: row.get(0)?,
                        stored_name: row.get(1)?,
                        original_name: row.get(2)?,
                        mime: row.get(3)?,
                        size_bytes: row.get(4)?,
                        checksum: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()?)
    }
}

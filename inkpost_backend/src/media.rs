use crate::config::InkpostPaths;
use crate::database::models::ImageRecord;
use crate::database::repositories::ImageRepository;
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::{Context, Result};
use blake3::Hasher;
use chrono::Utc;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("image data may not be empty")]
    Empty,
    #[error("image exceeds the {limit}-byte upload limit")]
    TooLarge { limit: u64 },
    #[error("only image uploads are accepted")]
    NotAnImage,
    #[error("an object named {0} already exists")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct MediaService {
    database: Database,
    paths: InkpostPaths,
    max_upload_bytes: u64,
}

impl MediaService {
    pub fn new(database: Database, paths: InkpostPaths, max_upload_bytes: u64) -> Self {
        Self {
            database,
            paths,
            max_upload_bytes,
        }
    }

    /// Validates and stores an uploaded image. The object name is derived
    /// from the upload time plus the sanitized original filename; an existing
    /// object of the same name is never overwritten.
    pub async fn save_image(&self, input: SaveImageInput) -> Result<ImageView, MediaError> {
        let stored_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_filename(input.original_name.as_deref().unwrap_or("upload"))
        );
        self.save_image_as(stored_name, input).await
    }

    pub(crate) async fn save_image_as(
        &self,
        stored_name: String,
        input: SaveImageInput,
    ) -> Result<ImageView, MediaError> {
        if input.data.is_empty() {
            return Err(MediaError::Empty);
        }
        if input.data.len() as u64 > self.max_upload_bytes {
            return Err(MediaError::TooLarge {
                limit: self.max_upload_bytes,
            });
        }
        if !looks_like_image(&input.data, input.mime.as_deref()) {
            return Err(MediaError::NotAnImage);
        }

        let existing = self
            .database
            .with_repositories(|repos| repos.images().get_by_stored_name(&stored_name))?;
        if existing.is_some() {
            return Err(MediaError::Conflict(stored_name));
        }

        let absolute_path = self.paths.media_dir.join(&stored_name);
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create media directory {}", parent.display()))
                .map_err(MediaError::Other)?;
        }
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&absolute_path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(MediaError::Conflict(stored_name));
            }
            Err(err) => {
                return Err(MediaError::Other(anyhow::Error::new(err).context(format!(
                    "failed to create media object {}",
                    absolute_path.display()
                ))));
            }
        };
        file.write_all(&input.data)
            .await
            .with_context(|| format!("failed to write media object {}", absolute_path.display()))
            .map_err(MediaError::Other)?;

        let mut hasher = Hasher::new();
        hasher.update(&input.data);
        let checksum = format!("blake3:{}", hasher.finalize().to_hex());

        let record = ImageRecord {
            id: Uuid::new_v4().to_string(),
            stored_name: stored_name.clone(),
            original_name: input.original_name,
            mime: input.mime,
            size_bytes: Some(input.data.len() as i64),
            checksum: Some(checksum),
            created_at: now_utc_iso(),
        };
        self.database.with_repositories(|repos| {
            repos.images().attach(&record)?;
            Ok(())
        })?;

        Ok(ImageView::from_record(record))
    }

    pub async fn open_media(&self, stored_name: &str) -> Result<Option<MediaDownload>> {
        let record = self
            .database
            .with_repositories(|repos| repos.images().get_by_stored_name(stored_name))?;
        let Some(record) = record else {
            return Ok(None);
        };
        let absolute_path = self.paths.media_dir.join(&record.stored_name);
        if fs::metadata(&absolute_path).await.is_err() {
            tracing::warn!(path = %absolute_path.display(), "media object missing on disk");
            return Ok(None);
        }
        Ok(Some(MediaDownload {
            metadata: ImageView::from_record(record),
            absolute_path,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct SaveImageInput {
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub id: String,
    /// Path relative to the API base, e.g. `/media/<stored_name>`.
    pub url: String,
    pub stored_name: String,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: Option<i64>,
    pub checksum: Option<String>,
}

impl ImageView {
    fn from_record(record: ImageRecord) -> Self {
        Self {
            id: record.id,
            url: format!("/media/{}", record.stored_name),
            stored_name: record.stored_name,
            original_name: record.original_name,
            mime: record.mime,
            size_bytes: record.size_bytes,
            checksum: record.checksum,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaDownload {
    pub metadata: ImageView,
    pub absolute_path: PathBuf,
}

/// Content sniff first; the declared content type only decides when sniffing
/// is inconclusive.
fn looks_like_image(data: &[u8], declared_mime: Option<&str>) -> bool {
    match infer::get(data) {
        Some(kind) => kind.matcher_type() == infer::MatcherType::Image,
        None => declared_mime
            .map(|mime| mime.starts_with("image/"))
            .unwrap_or(false),
    }
}

fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|file| file.to_str())
        .unwrap_or("upload")
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '-',
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
    use rusqlite::Connection;
    use tempfile::tempdir;
    use tokio::runtime::Runtime;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn png_bytes(len: usize) -> Vec<u8> {
        let mut data = PNG_HEADER.to_vec();
        data.resize(len, 0);
        data
    }

    fn setup(base: &Path, max_upload_bytes: u64) -> MediaService {
        let paths = InkpostPaths::from_base_dir(base).expect("paths");
        let conn = Connection::open_in_memory().expect("db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        MediaService::new(db, paths, max_upload_bytes)
    }

    #[test]
    fn save_and_serve_image() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempdir().expect("tempdir");
            let service = setup(temp.path(), DEFAULT_MAX_UPLOAD_BYTES);

            let image = service
                .save_image(SaveImageInput {
                    original_name: Some("my cover photo.png".into()),
                    mime: Some("image/png".into()),
                    data: png_bytes(64),
                })
                .await
                .expect("save image");

            assert!(image.stored_name.ends_with("-my-cover-photo.png"));
            assert_eq!(image.url, format!("/media/{}", image.stored_name));
            assert_eq!(image.size_bytes, Some(64));
            assert!(image
                .checksum
                .as_deref()
                .map(|c| c.starts_with("blake3:"))
                .unwrap_or(false));

            let download = service
                .open_media(&image.stored_name)
                .await
                .expect("open media")
                .expect("object exists");
            assert!(download.absolute_path.exists());
        });
    }

    #[test]
    fn oversized_uploads_are_rejected_before_any_write() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempdir().expect("tempdir");
            let service = setup(temp.path(), 16);

            let result = service
                .save_image(SaveImageInput {
                    original_name: Some("big.png".into()),
                    mime: Some("image/png".into()),
                    data: png_bytes(32),
                })
                .await;
            assert!(matches!(result, Err(MediaError::TooLarge { limit: 16 })));
            assert!(!temp.path().join("media").exists());
        });
    }

    #[test]
    fn non_image_uploads_are_rejected() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempdir().expect("tempdir");
            let service = setup(temp.path(), DEFAULT_MAX_UPLOAD_BYTES);

            let result = service
                .save_image(SaveImageInput {
                    original_name: Some("notes.txt".into()),
                    mime: Some("text/plain".into()),
                    data: b"just some text".to_vec(),
                })
                .await;
            assert!(matches!(result, Err(MediaError::NotAnImage)));

            let empty = service
                .save_image(SaveImageInput {
                    original_name: None,
                    mime: Some("image/png".into()),
                    data: Vec::new(),
                })
                .await;
            assert!(matches!(empty, Err(MediaError::Empty)));
        });
    }

    #[test]
    fn name_collisions_fail_instead_of_overwriting() {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let temp = tempdir().expect("tempdir");
            let service = setup(temp.path(), DEFAULT_MAX_UPLOAD_BYTES);

            let input = SaveImageInput {
                original_name: Some("cover.png".into()),
                mime: Some("image/png".into()),
                data: png_bytes(32),
            };
            service
                .save_image_as("fixed-cover.png".into(), input.clone())
                .await
                .expect("first save");

            let second = service.save_image_as("fixed-cover.png".into(), input).await;
            assert!(matches!(second, Err(MediaError::Conflict(name)) if name == "fixed-cover.png"));
        });
    }
}

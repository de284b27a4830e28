use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::models::{
    CommentView, CreateCommentRequest, CreatePostInput, CreatePostResponse, ErrorBody,
    HealthResponse, ListPostsResponse, PostView, SetViewsRequest, UploadResponse,
};

/// Upload cap enforced before any network call, mirroring the server limit.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("resource not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Rejected(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("invalid base URL")]
    InvalidUrl,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base = sanitize_base_url(base_url.into())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> Result<()> {
        self.base_url = sanitize_base_url(base_url.into())?;
        Ok(())
    }

    pub fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = check(self.client.get(self.url("/health")?).send()?)?;
        Ok(response.json()?)
    }

    /// Published posts, newest first. `None` or `"All"` applies no category
    /// filter.
    pub fn list_posts(
        &self,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<PostView>, ClientError> {
        let mut url = self.url("/posts")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(category) = category.filter(|c| *c != crate::category::WILDCARD) {
                pairs.append_pair("category", category);
            }
            if let Some(limit) = limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        let response = check(self.client.get(url).send()?)?;
        let body: ListPostsResponse = response.json()?;
        Ok(body.data)
    }

    pub fn get_post(&self, post_id: &str) -> Result<PostView, ClientError> {
        let url = self.url(&format!("/posts/{post_id}"))?;
        let response = check(self.client.get(url).send()?)?;
        Ok(response.json()?)
    }

    /// Best-effort view counter bump. The primary path is the atomic
    /// server-side increment; when that fails, falls back to a non-atomic
    /// read-then-write of `views + 1`. The fallback can under-count under
    /// concurrent viewers, which is accepted for a vanity metric.
    pub fn increment_views(&self, post_id: &str) -> Result<(), ClientError> {
        match self.bump_views(post_id) {
            Ok(()) => Ok(()),
            Err(primary) => {
                log::info!(
                    "atomic view increment failed ({primary}), falling back to read-then-write"
                );
                let post = self.get_post(post_id)?;
                self.set_views(post_id, post.views + 1)
            }
        }
    }

    fn bump_views(&self, post_id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("/posts/{post_id}/views"))?;
        check(self.client.post(url).send()?)?;
        Ok(())
    }

    fn set_views(&self, post_id: &str, views: i64) -> Result<(), ClientError> {
        let url = self.url(&format!("/posts/{post_id}/views"))?;
        check(
            self.client
                .put(url)
                .json(&SetViewsRequest { views })
                .send()?,
        )?;
        Ok(())
    }

    pub fn list_comments(&self, post_id: &str) -> Result<Vec<CommentView>, ClientError> {
        let url = self.url(&format!("/posts/{post_id}/comments"))?;
        let response = check(self.client.get(url).send()?)?;
        Ok(response.json()?)
    }

    pub fn create_comment(
        &self,
        post_id: &str,
        author_name: &str,
        content: &str,
    ) -> Result<CommentView, ClientError> {
        let url = self.url(&format!("/posts/{post_id}/comments"))?;
        let payload = CreateCommentRequest {
            author_name: author_name.to_string(),
            content: content.to_string(),
        };
        let response = check(self.client.post(url).json(&payload).send()?)?;
        Ok(response.json()?)
    }

    pub fn create_post(&self, input: &CreatePostInput) -> Result<PostView, ClientError> {
        let url = self.url("/posts")?;
        let response = check(self.client.post(url).json(input).send()?)?;
        let body: CreatePostResponse = response.json()?;
        Ok(body.data)
    }

    /// Uploads an image from disk. Size and content-type are checked before
    /// any network call.
    pub fn upload_image(&self, path: &Path) -> Result<String, ClientError> {
        let data = std::fs::read(path)?;
        let mime = validate_image_bytes(&data)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        let part = Part::bytes(data).file_name(file_name).mime_str(mime)?;
        let form = Form::new().part("image", part);
        let url = self.url("/upload")?;
        let response = check(self.client.post(url).multipart(form).send()?)?;
        let body: UploadResponse = response.json()?;
        Ok(body.url)
    }

    /// Resolves a server-relative media URL (`/media/...`) against the base.
    pub fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{url}", self.base_url)
        } else {
            format!("{}/{url}", self.base_url)
        }
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url).map_err(|_| ClientError::InvalidUrl)?;
        url.set_path(path.trim_start_matches('/'));
        Ok(url)
    }
}

/// Client-side mirror of the server's upload validation. Returns the sniffed
/// mime type on success.
pub fn validate_image_bytes(data: &[u8]) -> Result<&'static str, ClientError> {
    if data.len() as u64 > MAX_IMAGE_BYTES {
        return Err(ClientError::Rejected(format!(
            "image exceeds the {} MiB upload limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    match infer::get(data) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(kind.mime_type()),
        _ => Err(ClientError::Rejected(
            "only image files can be uploaded".into(),
        )),
    }
}

fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("request failed with status {status}"));
    Err(match status {
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::CONFLICT => ClientError::Conflict(message),
        _ if status.is_client_error() => ClientError::Rejected(message),
        _ => ClientError::Server(message),
    })
}

fn sanitize_base_url(mut base: String) -> Result<String> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    // Remove trailing slash for consistency
    while base.ends_with('/') {
        base.pop();
    }
    // Validate once
    let _ = Url::parse(&base).context("invalid base URL")?;
    Ok(base)
}

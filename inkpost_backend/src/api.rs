use crate::comments::{CommentService, CommentView, CreateCommentInput};
use crate::config::InkpostConfig;
use crate::database::Database;
use crate::media::{MediaError, MediaService, SaveImageInput};
use crate::posting::{CreatePostInput, PostService, PostView};
use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderValue, StatusCode,
};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::fs::File as TokioFile;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: InkpostConfig,
    pub database: Database,
}

impl AppState {
    fn posts(&self) -> PostService {
        PostService::new(self.database.clone(), self.config.author_name.clone())
    }

    fn comments(&self) -> CommentService {
        CommentService::new(self.database.clone())
    }

    fn media(&self) -> MediaService {
        MediaService::new(
            self.database.clone(),
            self.config.paths.clone(),
            self.config.max_upload_bytes,
        )
    }
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let port = start_port + offset;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "Port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "Could not find available port in range {}-{}",
        start_port,
        start_port + MAX_PORT_ATTEMPTS - 1
    )
}

pub async fn serve_http(config: InkpostConfig, database: Database) -> Result<()> {
    let state = AppState {
        config: config.clone(),
        database,
    };

    // Body limit sits above the media cap so oversized uploads hit the
    // validation error rather than a transport truncation.
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post))
        .route("/posts/:id/views", axum::routing::post(increment_views).put(set_views))
        .route("/posts/:id/comments", get(list_comments).post(create_comment))
        .route("/upload", axum::routing::post(upload_image))
        .route("/media/:name", get(download_media))
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let (listener, actual_port) = find_available_port(config.api_port).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], actual_port));

    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port = actual_port,
            "Configured port was in use, bound to next available port"
        );
    }

    tracing::info!(?addr, author_mode = config.author_mode, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
        author_mode: state.config.author_mode,
    })
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> ApiResult<ListPostsResponse> {
    let limit = params.limit.map(|l| l.min(200));
    let posts = state.posts().list_posts(params.category.as_deref(), limit)?;
    Ok(Json(ListPostsResponse { data: posts }))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PostView> {
    match state.posts().get_post(&id)? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound(format!("post {id} not found"))),
    }
}

async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<CreatePostResponse>), ApiError> {
    if !state.config.author_mode {
        return Err(ApiError::Forbidden(
            "post creation is only available in author mode".into(),
        ));
    }

    match state.posts().create_post(payload) {
        Ok(post) => Ok((
            StatusCode::CREATED,
            Json(CreatePostResponse {
                data: post,
                success: true,
            }),
        )),
        Err(err) if err.to_string().contains("may not be empty") => {
            Err(ApiError::BadRequest(err.to_string()))
        }
        Err(err) => Err(ApiError::Internal(err)),
    }
}

async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.posts().increment_views(&id)? {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::NotFound(format!("post {id} not found")))
    }
}

async fn set_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SetViewsRequest>,
) -> Result<StatusCode, ApiError> {
    match state.posts().set_views(&id, payload.views) {
        Ok(true) => Ok(StatusCode::OK),
        Ok(false) => Err(ApiError::NotFound(format!("post {id} not found"))),
        Err(err) if err.to_string().contains("may not be negative") => {
            Err(ApiError::BadRequest(err.to_string()))
        }
        Err(err) => Err(ApiError::Internal(err)),
    }
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<CommentView>> {
    let comments = state.comments().list_comments(&id)?;
    Ok(Json(comments))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let input = CreateCommentInput {
        post_id: id.clone(),
        author_name: payload.author_name,
        content: payload.content,
    };
    match state.comments().create_comment(input) {
        Ok(comment) => Ok((StatusCode::CREATED, Json(comment))),
        Err(err) if err.to_string().contains("post not found") => {
            Err(ApiError::NotFound(format!("post {id} not found")))
        }
        Err(err) if err.to_string().contains("may not be empty") => {
            Err(ApiError::BadRequest(err.to_string()))
        }
        Err(err) => Err(ApiError::Internal(err)),
    }
}

async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    if !state.config.author_mode {
        return Err(ApiError::Forbidden(
            "image uploads are only available in author mode".into(),
        ));
    }

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?
    {
        if field.name() == Some("image") {
            let original_name = field.file_name().map(|s| s.to_string());
            let mime = field.content_type().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::Internal(anyhow::Error::new(err)))?;
            upload = Some(SaveImageInput {
                original_name,
                mime,
                data: data.to_vec(),
            });
            break;
        }
    }

    let input = upload.ok_or_else(|| ApiError::BadRequest("missing image field".into()))?;
    match state.media().save_image(input).await {
        Ok(image) => Ok(Json(UploadResponse {
            url: image.url,
            success: true,
        })),
        Err(err @ (MediaError::Empty | MediaError::TooLarge { .. } | MediaError::NotAnImage)) => {
            Err(ApiError::BadRequest(err.to_string()))
        }
        Err(err @ MediaError::Conflict(_)) => Err(ApiError::Conflict(err.to_string())),
        Err(MediaError::Other(err)) => Err(ApiError::Internal(err)),
    }
}

async fn download_media(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let Some(download) = state
        .media()
        .open_media(&name)
        .await
        .map_err(ApiError::Internal)?
    else {
        return Err(ApiError::NotFound(format!("media object {name} not found")));
    };

    let file = TokioFile::open(&download.absolute_path)
        .await
        .with_context(|| format!("unable to open {}", download.absolute_path.display()))
        .map_err(ApiError::Internal)?;
    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);
    let mut response = Response::new(body);
    let headers = response.headers_mut();

    let content_type = download
        .metadata
        .mime
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Some(size) = download.metadata.size_bytes {
        if let Ok(value) = HeaderValue::from_str(&size.to_string()) {
            headers.insert(CONTENT_LENGTH, value);
        }
    }

    Ok(response)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
    author_mode: bool,
}

#[derive(Debug, Deserialize)]
struct ListPostsParams {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ListPostsResponse {
    data: Vec<PostView>,
}

#[derive(Serialize)]
struct CreatePostResponse {
    data: PostView,
    success: bool,
}

#[derive(Debug, Deserialize)]
struct SetViewsRequest {
    views: i64,
}

#[derive(Debug, Deserialize)]
struct CreateCommentRequest {
    author_name: String,
    content: String,
}

#[derive(Serialize)]
struct UploadResponse {
    url: String,
    success: bool,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse { error: msg }),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorResponse { error: msg }),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse { error: msg }),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse { error: msg }),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "internal server error".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

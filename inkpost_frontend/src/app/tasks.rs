use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use log::{error, warn};

use crate::api::ApiClient;
use crate::models::CreatePostInput;

use super::messages::AppMessage;

pub fn load_health(client: ApiClient, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = client.health();
        if tx.send(AppMessage::HealthLoaded(result)).is_err() {
            error!("failed to send HealthLoaded message");
        }
    });
}

pub fn load_posts(client: ApiClient, tx: Sender<AppMessage>, category: Option<String>) {
    thread::spawn(move || {
        let result = client.list_posts(category.as_deref(), None);
        if tx.send(AppMessage::PostsLoaded(result)).is_err() {
            error!("failed to send PostsLoaded message");
        }
    });
}

pub fn load_post(client: ApiClient, tx: Sender<AppMessage>, post_id: String) {
    thread::spawn(move || {
        let result = client.get_post(&post_id);
        let message = AppMessage::PostLoaded { post_id, result };
        if tx.send(message).is_err() {
            error!("failed to send PostLoaded message");
        }
    });
}

pub fn load_comments(client: ApiClient, tx: Sender<AppMessage>, post_id: String) {
    thread::spawn(move || {
        let result = client.list_comments(&post_id);
        let message = AppMessage::CommentsLoaded { post_id, result };
        if tx.send(message).is_err() {
            error!("failed to send CommentsLoaded message");
        }
    });
}

/// Fire-and-forget counter bump. Nothing is reported back to the view: a
/// failed increment must never block or degrade the detail page.
pub fn increment_views(client: ApiClient, post_id: String) {
    thread::spawn(move || {
        if let Err(err) = client.increment_views(&post_id) {
            warn!("view count increment failed for {post_id}: {err}");
        }
    });
}

pub fn create_comment(
    client: ApiClient,
    tx: Sender<AppMessage>,
    post_id: String,
    author_name: String,
    content: String,
) {
    thread::spawn(move || {
        let result = client.create_comment(&post_id, &author_name, &content);
        let message = AppMessage::CommentCreated { post_id, result };
        if tx.send(message).is_err() {
            error!("failed to send CommentCreated message");
        }
    });
}

pub fn publish_post(client: ApiClient, tx: Sender<AppMessage>, payload: CreatePostInput) {
    thread::spawn(move || {
        let result = client.create_post(&payload);
        if tx.send(AppMessage::PostPublished(result)).is_err() {
            error!("failed to send PostPublished message");
        }
    });
}

/// Opens the native file dialog, then uploads the chosen image. Validation
/// (size, sniffed content type) happens inside the client before any
/// network call.
pub fn pick_and_upload_image(client: ApiClient, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let picked: Option<PathBuf> = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp"])
            .pick_file();

        let message = match picked {
            Some(path) => AppMessage::ImageUploaded(client.upload_image(&path)),
            None => AppMessage::ImagePickCancelled,
        };
        if tx.send(message).is_err() {
            error!("failed to send ImageUploaded message");
        }
    });
}

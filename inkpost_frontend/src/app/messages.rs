use log::warn;

use crate::api::ClientError;
use crate::models::{CommentView, HealthResponse, PostView};

use super::state::ViewState;
use super::InkpostApp;

pub enum AppMessage {
    HealthLoaded(Result<HealthResponse, ClientError>),
    PostsLoaded(Result<Vec<PostView>, ClientError>),
    PostLoaded {
        post_id: String,
        result: Result<PostView, ClientError>,
    },
    CommentsLoaded {
        post_id: String,
        result: Result<Vec<CommentView>, ClientError>,
    },
    CommentCreated {
        post_id: String,
        result: Result<CommentView, ClientError>,
    },
    PostPublished(Result<PostView, ClientError>),
    ImageUploaded(Result<String, ClientError>),
    ImagePickCancelled,
}

/// Drains the channel. Completions are tagged with the post id they were
/// dispatched for; anything that no longer matches the active view arrived
/// after navigation and is dropped instead of applied to stale state.
pub(super) fn process_messages(app: &mut InkpostApp) {
    while let Ok(message) = app.rx.try_recv() {
        match message {
            AppMessage::HealthLoaded(result) => match result {
                Ok(health) => {
                    app.author_mode = health.author_mode;
                }
                Err(err) => {
                    warn!("health check failed: {err}");
                }
            },
            AppMessage::PostsLoaded(result) => {
                app.posts_loading = false;
                match result {
                    Ok(posts) => {
                        app.posts = posts;
                        app.posts_error = None;
                    }
                    Err(err) => {
                        app.posts_error = Some(format!("Failed to load posts: {err}"));
                    }
                }
            }
            AppMessage::PostLoaded { post_id, result } => {
                if let ViewState::Post(state) = &mut app.view {
                    if state.post_id == post_id {
                        state.is_loading = false;
                        match result {
                            Ok(post) => {
                                state.post = Some(post);
                                state.error = None;
                            }
                            Err(ClientError::NotFound) => {
                                state.not_found = true;
                            }
                            Err(err) => {
                                state.error = Some(format!("Failed to load post: {err}"));
                            }
                        }
                    }
                }
            }
            AppMessage::CommentsLoaded { post_id, result } => {
                if let ViewState::Post(state) = &mut app.view {
                    if state.post_id == post_id {
                        state.comments_loading = false;
                        match result {
                            Ok(comments) => {
                                state.comments = comments;
                                state.comments_error = None;
                            }
                            Err(err) => {
                                state.comments_error =
                                    Some(format!("Failed to load comments: {err}"));
                            }
                        }
                    }
                }
            }
            AppMessage::CommentCreated { post_id, result } => {
                if let ViewState::Post(state) = &mut app.view {
                    if state.post_id == post_id {
                        state.comment_sending = false;
                        match result {
                            Ok(comment) => {
                                // Newest-first: prepend without a refetch.
                                state.comments.insert(0, comment);
                                state.comment_body.clear();
                                state.comment_author.clear();
                                state.comment_error = None;
                            }
                            Err(err) => {
                                state.comment_error = Some(format!("Comment failed: {err}"));
                            }
                        }
                    }
                }
            }
            AppMessage::PostPublished(result) => {
                let mut published_title = None;
                if let ViewState::Write(state) = &mut app.view {
                    state.submitting = false;
                    match result {
                        Ok(post) => {
                            state.draft.on_published(&state.store);
                            published_title = Some(post.title);
                        }
                        Err(ClientError::Forbidden(message)) => {
                            state.error = Some(message);
                        }
                        Err(err) => {
                            state.error = Some(format!("Publish failed: {err}"));
                        }
                    }
                }
                if let Some(title) = published_title {
                    app.info_banner = Some(format!("Published \"{title}\""));
                    app.view = ViewState::Listing;
                    app.spawn_load_posts();
                }
            }
            AppMessage::ImageUploaded(result) => {
                if let ViewState::Write(state) = &mut app.view {
                    state.uploading = false;
                    match result {
                        Ok(url) => {
                            let image_markdown = format!("![image]({url})");
                            if state.content.is_empty() {
                                state.content = image_markdown;
                            } else {
                                state.content = format!("{}\n\n{image_markdown}\n", state.content);
                            }
                            // The first uploaded image becomes the cover.
                            if state.image_url.is_empty() {
                                state.image_url = url;
                            }
                            state.error = None;
                            state.draft.note_edit(std::time::Instant::now());
                        }
                        Err(err) => {
                            state.error = Some(format!("Image upload failed: {err}"));
                        }
                    }
                }
            }
            AppMessage::ImagePickCancelled => {
                if let ViewState::Write(state) = &mut app.view {
                    state.uploading = false;
                }
            }
        }
    }
}

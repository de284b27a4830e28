use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use eframe::egui::{self, Context};
use egui_commonmark::CommonMarkCache;
use log::error;

use crate::api::ApiClient;
use crate::category::WILDCARD;
use crate::listing::PageWindow;
use crate::models::PostView;

mod messages;
mod spawners;
mod state;
mod tasks;
mod ui;

use messages::AppMessage;
use state::ViewState;

/// Navigation requested by a view during rendering, applied once the view
/// borrow is released.
pub(crate) enum Nav {
    None,
    ToListing,
    ToPost(String),
}

pub struct InkpostApp {
    api: ApiClient,
    tx: Sender<AppMessage>,
    rx: Receiver<AppMessage>,
    /// Mirrors the backend's process-wide mode flag; the write surface stays
    /// hidden until the health probe confirms it.
    author_mode: bool,
    posts: Vec<PostView>,
    posts_loading: bool,
    posts_error: Option<String>,
    selected_category: String,
    window: PageWindow,
    view: ViewState,
    info_banner: Option<String>,
    markdown_cache: CommonMarkCache,
}

impl InkpostApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, initial_category: Option<String>) -> Self {
        let default_url = std::env::var("INKPOST_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
        let api = ApiClient::new(default_url).unwrap_or_else(|err| {
            error!("failed to initialise API client: {err}");
            ApiClient::new("http://127.0.0.1:8080").expect("fallback API client")
        });
        let (tx, rx) = mpsc::channel();

        let mut app = Self {
            api,
            tx,
            rx,
            author_mode: false,
            posts: Vec::new(),
            posts_loading: false,
            posts_error: None,
            selected_category: initial_category.unwrap_or_else(|| WILDCARD.to_string()),
            window: PageWindow::new(),
            view: ViewState::Listing,
            info_banner: None,
            markdown_cache: CommonMarkCache::default(),
        };
        app.spawn_load_posts();
        app.spawn_load_health();
        app
    }

    fn process_messages(&mut self) {
        messages::process_messages(self);
    }

    /// Something is in flight or a debounce deadline is pending; keep the
    /// frame loop ticking so completions and autosaves land promptly.
    fn wants_repaint(&self) -> bool {
        if self.posts_loading {
            return true;
        }
        match &self.view {
            ViewState::Listing => false,
            ViewState::Post(state) => {
                state.is_loading || state.comments_loading || state.comment_sending
            }
            ViewState::Write(state) => {
                state.uploading
                    || state.submitting
                    || matches!(state.draft.phase(), crate::draft::DraftPhase::Editing { .. })
            }
        }
    }
}

impl eframe::App for InkpostApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.process_messages();

        // Debounced autosave: persists only once the quiet period elapses.
        if let ViewState::Write(state) = &mut self.view {
            if state.draft.autosave_due(Instant::now()) {
                let draft = state.current_draft();
                state.draft.autosave(&state.store, draft);
            }
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Inkpost");
                if ui.button("Refresh").clicked() {
                    self.spawn_load_posts();
                }
                if self.author_mode && ui.button("Write").clicked() {
                    self.open_write();
                }
            });

            if let Some(message) = self.info_banner.clone() {
                let mut dismiss = false;
                egui::Frame::group(ui.style())
                    .fill(ui.visuals().extreme_bg_color)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(message.as_str());
                            if ui.button("Dismiss").clicked() {
                                dismiss = true;
                            }
                        });
                    });
                if dismiss {
                    self.info_banner = None;
                }
            }
        });

        let mut view = std::mem::replace(&mut self.view, ViewState::Listing);
        let nav = egui::CentralPanel::default()
            .show(ctx, |ui| match &mut view {
                ViewState::Listing => self.render_listing(ui),
                ViewState::Post(state) => self.render_post(ui, state),
                ViewState::Write(state) => self.render_write(ui, state),
            })
            .inner;
        self.view = view;

        match nav {
            Nav::None => {}
            Nav::ToListing => {
                self.view = ViewState::Listing;
            }
            Nav::ToPost(post_id) => {
                self.open_post(post_id);
            }
        }

        if self.wants_repaint() {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }
}

fn format_timestamp(ts: &str) -> String {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| {
            dt.with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M UTC")
                .to_string()
        })
        .unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::state::PostState;
    use super::*;
    use crate::models::CommentView;

    fn test_app() -> InkpostApp {
        let (tx, rx) = mpsc::channel();
        InkpostApp {
            // Nothing listens here; requests against it fail immediately.
            api: ApiClient::new("http://127.0.0.1:9").expect("client"),
            tx,
            rx,
            author_mode: false,
            posts: Vec::new(),
            posts_loading: false,
            posts_error: None,
            selected_category: WILDCARD.to_string(),
            window: PageWindow::new(),
            view: ViewState::Listing,
            info_banner: None,
            markdown_cache: CommonMarkCache::default(),
        }
    }

    fn post(id: &str) -> PostView {
        PostView {
            id: id.into(),
            title: format!("Post {id}"),
            content: "body".into(),
            category: "Infra".into(),
            excerpt: None,
            image_url: None,
            author: "Sungsoo Yang".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            published: true,
            views: 0,
        }
    }

    fn comment(id: &str, post_id: &str) -> CommentView {
        CommentView {
            id: id.into(),
            post_id: post_id.into(),
            author_name: "reader".into(),
            content: "hello".into(),
            created_at: "2024-01-02T00:00:00Z".into(),
        }
    }

    #[test]
    fn detail_page_loads_once_the_post_fetch_resolves() {
        let mut app = test_app();
        app.view = ViewState::Post(PostState::new("p1".into()));

        app.tx
            .send(AppMessage::PostLoaded {
                post_id: "p1".into(),
                result: Ok(post("p1")),
            })
            .unwrap();
        app.process_messages();

        let ViewState::Post(state) = &app.view else {
            panic!("expected post view");
        };
        assert!(!state.is_loading);
        assert!(state.post.is_some());
        // Comments are still in flight; the page renders without them.
        assert!(state.comments_loading);
    }

    #[test]
    fn failed_view_increments_never_reach_the_page() {
        let mut app = test_app();
        app.view = ViewState::Post(PostState::new("p1".into()));

        // Both the atomic and the read-then-write fallback paths fail
        // against an unreachable backend; the error stays in the task.
        assert!(app.api.increment_views("p1").is_err());

        app.tx
            .send(AppMessage::PostLoaded {
                post_id: "p1".into(),
                result: Ok(post("p1")),
            })
            .unwrap();
        app.process_messages();

        let ViewState::Post(state) = &app.view else {
            panic!("expected post view");
        };
        assert!(!state.is_loading);
        assert!(state.post.is_some());
        assert!(state.error.is_none());
    }

    #[test]
    fn completions_after_navigation_are_discarded() {
        let mut app = test_app();
        app.view = ViewState::Post(PostState::new("p2".into()));

        app.tx
            .send(AppMessage::PostLoaded {
                post_id: "p1".into(),
                result: Ok(post("p1")),
            })
            .unwrap();
        app.tx
            .send(AppMessage::CommentsLoaded {
                post_id: "p1".into(),
                result: Ok(vec![comment("c1", "p1")]),
            })
            .unwrap();
        app.process_messages();

        let ViewState::Post(state) = &app.view else {
            panic!("expected post view");
        };
        assert!(state.is_loading);
        assert!(state.post.is_none());
        assert!(state.comments.is_empty());
    }

    #[test]
    fn comment_success_prepends_without_refetch() {
        let mut app = test_app();
        let mut post_state = PostState::new("p1".into());
        post_state.comments = vec![comment("old", "p1")];
        post_state.comment_author = "reader".into();
        post_state.comment_body = "hello".into();
        post_state.comment_sending = true;
        app.view = ViewState::Post(post_state);

        app.tx
            .send(AppMessage::CommentCreated {
                post_id: "p1".into(),
                result: Ok(comment("new", "p1")),
            })
            .unwrap();
        app.process_messages();

        let ViewState::Post(state) = &app.view else {
            panic!("expected post view");
        };
        assert!(!state.comment_sending);
        assert_eq!(state.comments[0].id, "new");
        assert_eq!(state.comments[1].id, "old");
        assert!(state.comment_author.is_empty());
        assert!(state.comment_body.is_empty());
    }
}

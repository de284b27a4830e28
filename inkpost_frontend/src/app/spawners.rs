use std::time::Instant;

use crate::draft::DraftStore;
use crate::models::CreatePostInput;

use super::state::{PostState, ViewState, WriteState};
use super::tasks;
use super::InkpostApp;

impl InkpostApp {
    pub(super) fn spawn_load_health(&mut self) {
        tasks::load_health(self.api.clone(), self.tx.clone());
    }

    pub(super) fn spawn_load_posts(&mut self) {
        if self.posts_loading {
            return;
        }
        self.posts_loading = true;
        self.posts_error = None;
        tasks::load_posts(self.api.clone(), self.tx.clone(), None);
    }

    /// Entering a post view fires the content fetch, the comment fetch, and
    /// the view-count increment concurrently; none waits on another, and the
    /// increment is never awaited by the page at all.
    pub(super) fn open_post(&mut self, post_id: String) {
        self.view = ViewState::Post(PostState::new(post_id.clone()));
        tasks::load_post(self.api.clone(), self.tx.clone(), post_id.clone());
        tasks::load_comments(self.api.clone(), self.tx.clone(), post_id.clone());
        tasks::increment_views(self.api.clone(), post_id);
    }

    pub(super) fn open_write(&mut self) {
        if !self.author_mode {
            self.info_banner = Some("Writing is only available in author mode".into());
            return;
        }
        self.view = ViewState::Write(WriteState::open(DraftStore::at_default_location()));
    }

    pub(super) fn select_category(&mut self, category: String) {
        if self.selected_category != category {
            self.selected_category = category;
            // Back to the first page when the filter changes.
            self.window.reset();
        }
    }

    pub(super) fn spawn_submit_comment(&mut self, state: &mut PostState) {
        let author = state.comment_author.trim().to_string();
        let body = state.comment_body.trim().to_string();
        if author.is_empty() || body.is_empty() {
            state.comment_error = Some("Name and comment text are both required".into());
            return;
        }
        state.comment_sending = true;
        state.comment_error = None;
        tasks::create_comment(
            self.api.clone(),
            self.tx.clone(),
            state.post_id.clone(),
            author,
            body,
        );
    }

    pub(super) fn spawn_publish(&mut self, state: &mut WriteState) {
        if state.title.trim().is_empty()
            || state.content.trim().is_empty()
            || state.category.trim().is_empty()
        {
            state.error = Some("Title, content, and category are all required".into());
            return;
        }
        let payload = CreatePostInput {
            title: state.title.trim().to_string(),
            content: state.content.clone(),
            category: state.category.clone(),
            image_url: if state.image_url.trim().is_empty() {
                None
            } else {
                Some(state.image_url.clone())
            },
        };
        state.submitting = true;
        state.error = None;
        tasks::publish_post(self.api.clone(), self.tx.clone(), payload);
    }

    pub(super) fn spawn_upload_image(&mut self, state: &mut WriteState) {
        if state.uploading {
            return;
        }
        state.uploading = true;
        state.error = None;
        tasks::pick_and_upload_image(self.api.clone(), self.tx.clone());
    }

    pub(super) fn note_write_edit(state: &mut WriteState) {
        state.draft.note_edit(Instant::now());
    }
}

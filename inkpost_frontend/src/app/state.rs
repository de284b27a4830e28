use crate::draft::{DraftMachine, DraftStore, LocalDraft};
use crate::models::{CommentView, PostView};

pub enum ViewState {
    Listing,
    Post(PostState),
    Write(WriteState),
}

pub struct PostState {
    pub post_id: String,
    pub post: Option<PostView>,
    pub is_loading: bool,
    pub not_found: bool,
    pub error: Option<String>,
    pub comments: Vec<CommentView>,
    pub comments_loading: bool,
    pub comments_error: Option<String>,
    pub comment_author: String,
    pub comment_body: String,
    pub comment_error: Option<String>,
    pub comment_sending: bool,
}

impl PostState {
    pub fn new(post_id: String) -> Self {
        Self {
            post_id,
            post: None,
            is_loading: true,
            not_found: false,
            error: None,
            comments: Vec::new(),
            comments_loading: true,
            comments_error: None,
            comment_author: String::new(),
            comment_body: String::new(),
            comment_error: None,
            comment_sending: false,
        }
    }
}

pub struct WriteState {
    pub title: String,
    pub content: String,
    pub category: String,
    pub image_url: String,
    pub preview: bool,
    pub uploading: bool,
    pub submitting: bool,
    pub error: Option<String>,
    pub draft: DraftMachine,
    pub store: DraftStore,
}

impl WriteState {
    pub fn open(store: DraftStore) -> Self {
        let draft = DraftMachine::on_mount(&store);
        Self {
            title: String::new(),
            content: String::new(),
            category: String::new(),
            image_url: String::new(),
            preview: false,
            uploading: false,
            submitting: false,
            error: None,
            draft,
            store,
        }
    }

    /// Snapshot of the editor fields for the draft slot.
    pub fn current_draft(&self) -> LocalDraft {
        LocalDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            image_url: self.image_url.clone(),
            saved_at: String::new(),
        }
    }

    pub fn apply_draft(&mut self, draft: LocalDraft) {
        self.title = draft.title;
        self.content = draft.content;
        self.category = draft.category;
        self.image_url = draft.image_url;
    }
}

//! Editor draft autosave/restore.
//!
//! A single draft slot lives in one JSON file; writes always overwrite.
//! The state machine debounces field edits: only the last edit in a
//! two-second quiet period triggers a persist, and nothing fires once the
//! editor is gone.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_secs(2);

const DRAFT_FILE: &str = "draft.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub saved_at: String,
}

impl LocalDraft {
    /// A draft is only worth offering back when some field carries text.
    pub fn has_content(&self) -> bool {
        !self.title.trim().is_empty()
            || !self.content.trim().is_empty()
            || !self.category.trim().is_empty()
            || !self.image_url.trim().is_empty()
    }
}

/// The single persistent draft slot. Last write wins; there is exactly one
/// writer (the local editing session).
pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn at_default_location() -> Self {
        let base = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".inkpost");
        Self::new(base.join(DRAFT_FILE))
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the stored draft, or `None` when the slot is empty or
    /// unreadable. A corrupt slot is treated as empty rather than an error.
    pub fn load(&self) -> Option<LocalDraft> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(draft) => Some(draft),
            Err(err) => {
                log::warn!("discarding unreadable draft at {}: {err}", self.path.display());
                None
            }
        }
    }

    pub fn save(&self, draft: &LocalDraft) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string(draft).context("failed to encode draft")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write draft to {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| {
                format!("failed to remove draft at {}", self.path.display())
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftPhase {
    Empty,
    /// Unsaved edits exist; a persist fires at `deadline` unless another
    /// edit moves it.
    Editing { deadline: Instant },
    Saved { saved_at: String },
    RestorePrompt { draft: LocalDraft },
}

pub struct DraftMachine {
    phase: DraftPhase,
}

impl DraftMachine {
    /// Editor mount: a stored draft with any non-empty field is offered for
    /// restoration; otherwise the editor starts clean.
    pub fn on_mount(store: &DraftStore) -> Self {
        let phase = match store.load() {
            Some(draft) if draft.has_content() => DraftPhase::RestorePrompt { draft },
            _ => DraftPhase::Empty,
        };
        Self { phase }
    }

    pub fn phase(&self) -> &DraftPhase {
        &self.phase
    }

    pub fn restore_prompt(&self) -> Option<&LocalDraft> {
        match &self.phase {
            DraftPhase::RestorePrompt { draft } => Some(draft),
            _ => None,
        }
    }

    /// User confirmed restoration: hands back the draft fields and records
    /// its original save time.
    pub fn accept_restore(&mut self) -> Option<LocalDraft> {
        let DraftPhase::RestorePrompt { draft } = self.phase.clone() else {
            return None;
        };
        self.phase = DraftPhase::Saved {
            saved_at: draft.saved_at.clone(),
        };
        Some(draft)
    }

    /// User declined: the stored draft is erased.
    pub fn decline_restore(&mut self, store: &DraftStore) {
        if !matches!(self.phase, DraftPhase::RestorePrompt { .. }) {
            return;
        }
        if let Err(err) = store.clear() {
            log::warn!("failed to discard stored draft: {err:#}");
        }
        self.phase = DraftPhase::Empty;
    }

    /// A field changed. Restarts the debounce window; edits while the
    /// restore prompt is up are ignored (the prompt blocks the editor).
    pub fn note_edit(&mut self, now: Instant) {
        if matches!(self.phase, DraftPhase::RestorePrompt { .. }) {
            return;
        }
        self.phase = DraftPhase::Editing {
            deadline: now + AUTOSAVE_DEBOUNCE,
        };
    }

    /// True once the quiet period has elapsed and a persist is owed.
    pub fn autosave_due(&self, now: Instant) -> bool {
        matches!(&self.phase, DraftPhase::Editing { deadline } if now >= *deadline)
    }

    /// Persists the current editor fields into the slot. Called by the
    /// update loop when `autosave_due` reports true.
    pub fn autosave(&mut self, store: &DraftStore, mut draft: LocalDraft) {
        draft.saved_at = Utc::now().to_rfc3339();
        match store.save(&draft) {
            Ok(()) => {
                self.phase = DraftPhase::Saved {
                    saved_at: draft.saved_at,
                };
            }
            Err(err) => {
                log::warn!("draft autosave failed: {err:#}");
                // Leave the phase untouched so the next poll retries.
            }
        }
    }

    /// Publish succeeded: the slot is cleared and the editor is clean.
    pub fn on_published(&mut self, store: &DraftStore) {
        if let Err(err) = store.clear() {
            log::warn!("failed to clear draft after publish: {err:#}");
        }
        self.phase = DraftPhase::Empty;
    }

    /// Editor unmount: drops any pending deadline so nothing fires later.
    pub fn cancel_pending(&mut self) {
        if matches!(self.phase, DraftPhase::Editing { .. }) {
            self.phase = DraftPhase::Empty;
        }
    }

    pub fn saved_at(&self) -> Option<&str> {
        match &self.phase {
            DraftPhase::Saved { saved_at } => Some(saved_at),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> DraftStore {
        DraftStore::new(dir.path().join(DRAFT_FILE))
    }

    fn draft(title: &str) -> LocalDraft {
        LocalDraft {
            title: title.into(),
            ..LocalDraft::default()
        }
    }

    #[test]
    fn store_overwrites_a_single_slot() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.load().is_none());
        store.save(&draft("first")).unwrap();
        store.save(&draft("second")).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.title, "second");

        store.clear().unwrap();
        assert!(store.load().is_none());
        // Clearing an already-empty slot is not an error.
        store.clear().unwrap();
    }

    #[test]
    fn mount_with_no_draft_starts_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let machine = DraftMachine::on_mount(&store);
        assert_eq!(*machine.phase(), DraftPhase::Empty);
    }

    #[test]
    fn mount_ignores_a_draft_with_only_blank_fields() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&LocalDraft::default()).unwrap();

        let machine = DraftMachine::on_mount(&store);
        assert_eq!(*machine.phase(), DraftPhase::Empty);
    }

    #[test]
    fn debounce_coalesces_rapid_edits_into_one_save() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let mut machine = DraftMachine::on_mount(&store);

        let t0 = Instant::now();
        machine.note_edit(t0);
        machine.note_edit(t0 + Duration::from_millis(800));

        // Two seconds after the first edit: the second edit pushed the
        // deadline, so nothing is due yet.
        assert!(!machine.autosave_due(t0 + Duration::from_secs(2)));
        let due_at = t0 + Duration::from_millis(2900);
        assert!(machine.autosave_due(due_at));

        machine.autosave(&store, draft("coalesced"));
        assert!(matches!(machine.phase(), DraftPhase::Saved { .. }));
        assert_eq!(store.load().unwrap().title, "coalesced");

        // Exactly one write: nothing further is due without a new edit.
        assert!(!machine.autosave_due(due_at + Duration::from_secs(10)));
    }

    #[test]
    fn a_single_quiet_edit_saves_once() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let mut machine = DraftMachine::on_mount(&store);

        let t0 = Instant::now();
        machine.note_edit(t0);
        assert!(!machine.autosave_due(t0 + Duration::from_millis(1999)));
        assert!(machine.autosave_due(t0 + Duration::from_secs(2)));

        machine.autosave(&store, draft("quiet"));
        assert_eq!(store.load().unwrap().title, "quiet");
    }

    #[test]
    fn restore_accept_recovers_the_fields() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&LocalDraft {
                title: "X".into(),
                saved_at: "2024-01-01T00:00:00Z".into(),
                ..LocalDraft::default()
            })
            .unwrap();

        let mut machine = DraftMachine::on_mount(&store);
        assert!(machine.restore_prompt().is_some());

        // Edits are ignored while the prompt is up.
        machine.note_edit(Instant::now());
        assert!(machine.restore_prompt().is_some());

        let restored = machine.accept_restore().unwrap();
        assert_eq!(restored.title, "X");
        assert_eq!(machine.saved_at(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn restore_decline_erases_the_slot() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&draft("X")).unwrap();

        let mut machine = DraftMachine::on_mount(&store);
        machine.decline_restore(&store);

        assert_eq!(*machine.phase(), DraftPhase::Empty);
        assert!(store.load().is_none());
    }

    #[test]
    fn publish_clears_the_slot() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let mut machine = DraftMachine::on_mount(&store);

        let t0 = Instant::now();
        machine.note_edit(t0);
        machine.autosave(&store, draft("about to publish"));
        assert!(store.load().is_some());

        machine.on_published(&store);
        assert_eq!(*machine.phase(), DraftPhase::Empty);
        assert!(store.load().is_none());
    }

    #[test]
    fn unmount_cancels_a_pending_save() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        let mut machine = DraftMachine::on_mount(&store);

        let t0 = Instant::now();
        machine.note_edit(t0);
        machine.cancel_pending();
        assert!(!machine.autosave_due(t0 + Duration::from_secs(5)));
        assert!(store.load().is_none());
    }
}

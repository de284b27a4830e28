use eframe::egui::{self, Color32, RichText};

use crate::category::{CATEGORIES, WILDCARD};
use crate::draft::DraftPhase;

use super::super::state::WriteState;
use super::super::{format_timestamp, InkpostApp, Nav};

impl InkpostApp {
    pub(crate) fn render_write(&mut self, ui: &mut egui::Ui, state: &mut WriteState) -> Nav {
        let mut nav = Nav::None;

        if !self.author_mode {
            ui.vertical_centered(|ui| {
                ui.heading("No access");
                ui.label("Writing is only available in author mode.");
                if ui.button("Back to posts").clicked() {
                    nav = Nav::ToListing;
                }
            });
            return nav;
        }

        // The restore prompt blocks the editor until answered.
        if let Some(draft) = state.draft.restore_prompt().cloned() {
            ui.vertical_centered(|ui| {
                ui.heading("Restore draft?");
                let saved = if draft.saved_at.is_empty() {
                    "an earlier session".to_string()
                } else {
                    format_timestamp(&draft.saved_at)
                };
                ui.label(format!("An unpublished draft from {saved} was found."));
                if !draft.title.trim().is_empty() {
                    ui.label(RichText::new(format!("\"{}\"", draft.title)).italics());
                }
                ui.horizontal(|ui| {
                    if ui.button("Restore").clicked() {
                        if let Some(restored) = state.draft.accept_restore() {
                            state.apply_draft(restored);
                        }
                    }
                    if ui.button("Discard").clicked() {
                        state.draft.decline_restore(&state.store);
                    }
                });
            });
            return nav;
        }

        let mut edited = false;
        let mut upload_clicked = false;
        let mut publish_clicked = false;

        ui.horizontal(|ui| {
            if ui.button("← Back").clicked() {
                nav = Nav::ToListing;
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let can_publish = !state.submitting;
                let publish_label = if state.submitting {
                    "Publishing..."
                } else {
                    "Publish"
                };
                if ui
                    .add_enabled(can_publish, egui::Button::new(publish_label))
                    .clicked()
                {
                    publish_clicked = true;
                }
                if ui
                    .selectable_label(state.preview, "Preview")
                    .clicked()
                {
                    state.preview = !state.preview;
                }
            });
        });

        match state.draft.phase() {
            DraftPhase::Saved { saved_at } => {
                ui.label(
                    RichText::new(format!("Draft saved {}", format_timestamp(saved_at))).weak(),
                );
            }
            DraftPhase::Editing { .. } => {
                ui.label(RichText::new("Unsaved changes…").weak());
            }
            _ => {}
        }
        if let Some(err) = &state.error {
            ui.colored_label(Color32::LIGHT_RED, err);
        }
        ui.separator();

        if ui
            .add(egui::TextEdit::singleline(&mut state.title).hint_text("Title"))
            .changed()
        {
            edited = true;
        }

        ui.horizontal(|ui| {
            let selected_text = if state.category.is_empty() {
                "Pick a category"
            } else {
                state.category.as_str()
            };
            egui::ComboBox::from_id_salt("write_category")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    // The wildcard is a filter sentinel, not a real category.
                    for name in CATEGORIES.iter().filter(|name| **name != WILDCARD) {
                        if ui
                            .selectable_value(&mut state.category, name.to_string(), *name)
                            .clicked()
                        {
                            edited = true;
                        }
                    }
                });

            let upload_label = if state.uploading {
                "Uploading..."
            } else {
                "Upload image"
            };
            if ui
                .add_enabled(!state.uploading, egui::Button::new(upload_label))
                .clicked()
            {
                upload_clicked = true;
            }
        });

        egui::ScrollArea::vertical().show(ui, |ui| {
            if state.preview {
                egui_commonmark::CommonMarkViewer::new().show(
                    ui,
                    &mut self.markdown_cache,
                    &state.content,
                );
            } else if ui
                .add(
                    egui::TextEdit::multiline(&mut state.content)
                        .hint_text("Write your post in markdown...")
                        .desired_rows(24)
                        .desired_width(f32::INFINITY),
                )
                .changed()
            {
                edited = true;
            }
        });

        if edited {
            Self::note_write_edit(state);
        }
        if upload_clicked {
            self.spawn_upload_image(state);
        }
        if publish_clicked {
            self.spawn_publish(state);
        }
        if matches!(nav, Nav::ToListing) {
            // Leaving the editor: nothing may fire after unmount.
            state.draft.cancel_pending();
        }

        nav
    }
}

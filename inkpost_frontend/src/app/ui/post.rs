use eframe::egui::{self, Color32, RichText};

use crate::category;

use super::super::state::PostState;
use super::super::{format_timestamp, InkpostApp, Nav};

impl InkpostApp {
    pub(crate) fn render_post(&mut self, ui: &mut egui::Ui, state: &mut PostState) -> Nav {
        let mut nav = Nav::None;

        if ui.button("← Back to posts").clicked() {
            nav = Nav::ToListing;
        }
        ui.separator();

        if state.is_loading {
            ui.add(egui::Spinner::new());
            return nav;
        }
        if state.not_found {
            ui.vertical_centered(|ui| {
                ui.heading("Post not found");
                ui.label("The post you are looking for does not exist.");
            });
            return nav;
        }
        if let Some(err) = &state.error {
            ui.colored_label(Color32::LIGHT_RED, err);
            return nav;
        }
        let Some(post) = &state.post else {
            return nav;
        };

        let mut submit_comment = false;
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.label(
                RichText::new(&post.category)
                    .color(Color32::WHITE)
                    .background_color(category::color_for(&post.category)),
            );
            ui.heading(&post.title);
            ui.horizontal(|ui| {
                ui.label(&post.author);
                ui.label(format_timestamp(&post.created_at));
                let minutes = (post.content.chars().count() + 499) / 500;
                ui.label(format!("{minutes} min read"));
                ui.label(format!("{} views", post.views));
            });
            ui.separator();

            egui_commonmark::CommonMarkViewer::new().show(
                ui,
                &mut self.markdown_cache,
                &post.content,
            );

            ui.separator();
            ui.heading(format!("Comments ({})", state.comments.len()));

            ui.add_enabled_ui(!state.comment_sending, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Name");
                    ui.text_edit_singleline(&mut state.comment_author);
                });
                ui.add(
                    egui::TextEdit::multiline(&mut state.comment_body)
                        .hint_text("Write a comment...")
                        .desired_rows(3),
                );
                if ui.button("Post comment").clicked() {
                    submit_comment = true;
                }
            });
            if let Some(err) = &state.comment_error {
                ui.colored_label(Color32::LIGHT_RED, err);
            }

            if state.comments_loading {
                ui.add(egui::Spinner::new());
            } else if let Some(err) = &state.comments_error {
                ui.colored_label(Color32::LIGHT_RED, err);
            } else if state.comments.is_empty() {
                ui.label("Be the first to leave a comment.");
            }

            for comment in &state.comments {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&comment.author_name).strong());
                        ui.label(format_timestamp(&comment.created_at));
                    });
                    ui.label(&comment.content);
                });
            }
        });

        if submit_comment {
            self.spawn_submit_comment(state);
        }

        nav
    }
}

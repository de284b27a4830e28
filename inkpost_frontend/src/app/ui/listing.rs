use chrono::Utc;
use eframe::egui::{self, Color32, RichText};

use crate::category::{self, WILDCARD};
use crate::listing;

use super::super::{format_timestamp, InkpostApp, Nav};

impl InkpostApp {
    pub(crate) fn render_listing(&mut self, ui: &mut egui::Ui) -> Nav {
        let mut nav = Nav::None;

        if self.posts_loading && self.posts.is_empty() {
            ui.add(egui::Spinner::new());
        }
        if let Some(err) = &self.posts_error {
            ui.colored_label(Color32::LIGHT_RED, err);
            if ui.button("Retry").clicked() {
                self.spawn_load_posts();
            }
            ui.separator();
        }

        let counts = listing::counts_by_category(&self.posts);
        let mut selected: Option<String> = None;
        ui.horizontal_wrapped(|ui| {
            for name in category::CATEGORIES {
                let count = counts.get(name).copied().unwrap_or(0);
                // Empty categories stay hidden; the wildcard chip always shows.
                if name != WILDCARD && count == 0 {
                    continue;
                }
                let is_selected = self.selected_category == name;
                let label = RichText::new(format!("{name} ({count})")).color(Color32::WHITE);
                let chip = egui::Button::new(label)
                    .fill(category::color_for(name))
                    .selected(is_selected);
                if ui.add(chip).clicked() {
                    selected = Some(name.to_string());
                }
            }
        });
        if let Some(name) = selected {
            self.select_category(name);
        }
        ui.separator();

        let visible = listing::visible_posts(&self.posts, &self.selected_category);
        let shown = self.window.visible(visible.len());
        let has_more = self.window.has_more(visible.len());
        let mut post_to_open: Option<String> = None;
        let mut load_more = false;
        let now = Utc::now();

        egui::ScrollArea::vertical().show(ui, |ui| {
            if visible.is_empty() && !self.posts_loading {
                ui.label("No posts in this category yet.");
            }

            for post in &visible[..shown] {
                egui::Frame::group(ui.style())
                    .fill(ui.visuals().extreme_bg_color)
                    .inner_margin(egui::vec2(12.0, 8.0))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            if ui.button(RichText::new(&post.title).strong()).clicked() {
                                post_to_open = Some(post.id.clone());
                            }
                            if listing::is_new(&post.created_at, now) {
                                ui.label(
                                    RichText::new("New")
                                        .color(Color32::WHITE)
                                        .background_color(Color32::from_rgb(34, 197, 94)),
                                );
                            }
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    ui.label(format_timestamp(&post.created_at));
                                    ui.label(format!("{} views", post.views));
                                },
                            );
                        });
                        ui.label(
                            RichText::new(&post.category)
                                .color(category::color_for(&post.category))
                                .small(),
                        );
                        if let Some(excerpt) = &post.excerpt {
                            ui.label(excerpt);
                        }
                    });
            }

            if has_more {
                ui.vertical_centered(|ui| {
                    if ui.button("Load more").clicked() {
                        load_more = true;
                    }
                });
            }
        });

        let total = visible.len();
        drop(visible);
        if load_more {
            self.window.load_more(total);
        }
        if let Some(id) = post_to_open {
            nav = Nav::ToPost(id);
        }

        nav
    }
}

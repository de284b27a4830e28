pub mod api;
pub mod app;
pub mod category;
pub mod draft;
pub mod listing;
pub mod models;

use eframe::{self, egui};

pub use app::InkpostApp;

/// Launches the egui application with default window options.
pub fn run_frontend(initial_category: Option<String>) -> Result<(), eframe::Error> {
    let _ = env_logger::builder().is_test(false).try_init();
    eframe::run_native(
        "Inkpost",
        default_native_options(),
        Box::new(|cc| Ok(Box::new(InkpostApp::new(cc, initial_category)))),
    )
}

fn default_native_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    }
}

//! The closed editorial category vocabulary and its display mapping.

use eframe::egui::Color32;

/// Sentinel meaning "apply no category filter".
pub const WILDCARD: &str = "All";

/// Filter chip order; `All` first, then the editorial set.
pub const CATEGORIES: [&str; 7] = [
    WILDCARD,
    "JobSync",
    "React.js",
    "Next.js",
    "TypeScript",
    "Infra",
    "Nest",
];

const FALLBACK_COLOR: Color32 = Color32::from_rgb(107, 114, 128);

/// Total mapping from a category label to its badge color. Unrecognized
/// labels get a neutral gray rather than an error.
pub fn color_for(category: &str) -> Color32 {
    match category {
        "All" => Color32::from_rgb(168, 85, 247),
        "JobSync" => Color32::from_rgb(249, 115, 22),
        "React.js" => Color32::from_rgb(14, 165, 233),
        "Next.js" => Color32::from_rgb(34, 197, 94),
        "TypeScript" => Color32::from_rgb(59, 130, 246),
        "Infra" => Color32::from_rgb(249, 115, 22),
        "Nest" => Color32::from_rgb(239, 68, 68),
        _ => FALLBACK_COLOR,
    }
}

/// Maps a route-style slug to the category label the repository filter
/// expects. Unrecognized slugs pass through unchanged.
pub fn slug_to_category(slug: &str) -> String {
    match slug {
        "development" => "JobSync".to_string(),
        "react" => "React.js".to_string(),
        "nextjs" => "Next.js".to_string(),
        "typescript" => "TypeScript".to_string(),
        "infra" => "Infra".to_string(),
        "nestjs" => "Nest".to_string(),
        other => other.to_string(),
    }
}

//! Pure listing logic: per-category counts, the visible subset for a
//! selected category, and the incremental "load more" window.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::category::WILDCARD;
use crate::models::PostView;

pub const PAGE_SIZE: usize = 9;

/// Days within which a post still carries the "New" badge.
const NEW_POST_DAYS: i64 = 7;

/// Per-category counts over the full fetched collection, plus a synthetic
/// wildcard entry equal to the total.
pub fn counts_by_category(posts: &[PostView]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for post in posts {
        *counts.entry(post.category.clone()).or_insert(0) += 1;
    }
    counts.insert(WILDCARD.to_string(), posts.len());
    counts
}

/// The subsequence visible under the selected category, original order
/// preserved. The wildcard is the identity filter.
pub fn visible_posts<'a>(posts: &'a [PostView], selected: &str) -> Vec<&'a PostView> {
    posts
        .iter()
        .filter(|post| selected == WILDCARD || post.category == selected)
        .collect()
}

/// Incremental reveal over a filtered listing: starts at one page and grows
/// by a page per "load more", saturating at the collection length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    shown: usize,
}

impl PageWindow {
    pub fn new() -> Self {
        Self { shown: PAGE_SIZE }
    }

    pub fn visible(&self, total: usize) -> usize {
        self.shown.min(total)
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.shown < total
    }

    pub fn load_more(&mut self, total: usize) {
        self.shown = (self.shown + PAGE_SIZE).min(total.max(PAGE_SIZE));
    }

    /// Back to the first page; invoked when the selected category changes.
    pub fn reset(&mut self) {
        self.shown = PAGE_SIZE;
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// A post is "new" iff it is at most seven ceiling-days old. Unparseable
/// timestamps are never new.
pub fn is_new(created_at: &str, now: DateTime<Utc>) -> bool {
    let Ok(created) = DateTime::parse_from_rfc3339(created_at) else {
        return false;
    };
    let elapsed = (now - created.with_timezone(&Utc)).num_seconds().abs();
    let days = (elapsed + 86_399) / 86_400;
    days <= NEW_POST_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn post(id: &str, category: &str) -> PostView {
        PostView {
            id: id.into(),
            title: format!("Post {id}"),
            content: "body".into(),
            category: category.into(),
            excerpt: None,
            image_url: None,
            author: "Sungsoo Yang".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            published: true,
            views: 0,
        }
    }

    fn sample_posts() -> Vec<PostView> {
        vec![
            post("a", "TypeScript"),
            post("b", "Infra"),
            post("c", "TypeScript"),
            post("d", "Nest"),
        ]
    }

    #[test]
    fn counts_include_the_wildcard_total() {
        let posts = sample_posts();
        let counts = counts_by_category(&posts);

        assert_eq!(counts[WILDCARD], posts.len());
        assert_eq!(counts["TypeScript"], 2);
        assert_eq!(counts["Infra"], 1);

        let sum: usize = counts
            .iter()
            .filter(|(key, _)| key.as_str() != WILDCARD)
            .map(|(_, count)| count)
            .sum();
        assert_eq!(sum, posts.len());
    }

    #[test]
    fn wildcard_selection_is_identity() {
        let posts = sample_posts();
        let visible = visible_posts(&posts, WILDCARD);
        assert_eq!(visible.len(), posts.len());
        let ids: Vec<_> = visible.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn category_selection_preserves_order() {
        let posts = sample_posts();
        let visible = visible_posts(&posts, "TypeScript");
        let ids: Vec<_> = visible.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(visible.iter().all(|p| p.category == "TypeScript"));
    }

    #[test]
    fn window_grows_monotonically_and_saturates() {
        let total = 20;
        let mut window = PageWindow::new();
        assert_eq!(window.visible(total), 9);
        assert!(window.has_more(total));

        let mut previous = window.visible(total);
        for _ in 0..5 {
            window.load_more(total);
            let visible = window.visible(total);
            assert!(visible >= previous);
            previous = visible;
        }
        assert_eq!(window.visible(total), total);
        assert!(!window.has_more(total));

        window.reset();
        assert_eq!(window.visible(total), 9);
    }

    #[test]
    fn window_handles_short_collections() {
        let mut window = PageWindow::new();
        assert_eq!(window.visible(3), 3);
        assert!(!window.has_more(3));
        window.load_more(3);
        assert_eq!(window.visible(3), 3);
    }

    #[test]
    fn recent_posts_are_new_for_seven_ceiling_days() {
        let now = Utc::now();
        let fresh = (now - Duration::days(3)).to_rfc3339();
        let boundary = (now - Duration::days(7) + Duration::hours(1)).to_rfc3339();
        let stale = (now - Duration::days(8)).to_rfc3339();

        assert!(is_new(&fresh, now));
        assert!(is_new(&boundary, now));
        assert!(!is_new(&stale, now));
        assert!(!is_new("not a timestamp", now));
    }
}

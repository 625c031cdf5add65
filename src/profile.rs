//! Read-only views derived from the store and preferences: the profile
//! summary and the article detail.

use std::collections::BTreeMap;

use crate::content::{resolve_favorites, Article, ArticleId, Category};
use crate::preferences::PreferenceSnapshot;
use crate::related::related;

// ============================================================================
// Profile
// ============================================================================

/// Favorite-derived statistics for the profile screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub display_name: String,
    /// Favorites that still resolve to an article, in store order.
    pub favorites: Vec<Article>,
    /// Sum of `reading_time` over resolved favorites, in minutes.
    pub total_reading_minutes: u32,
    /// Favorites per category, most first. Equal counts keep category order.
    pub category_stats: Vec<(Category, usize)>,
}

impl ProfileSummary {
    pub fn build(articles: &[Article], prefs: &PreferenceSnapshot) -> Self {
        let favorites = resolve_favorites(articles, &prefs.favorite_ids);
        let total_reading_minutes = favorites.iter().map(|a| a.reading_time).sum();

        let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
        for article in &favorites {
            *counts.entry(article.category).or_default() += 1;
        }
        let mut category_stats: Vec<_> = counts.into_iter().collect();
        // Stable sort over category-ordered input keeps ties in category order.
        category_stats.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            display_name: prefs.display_name.clone(),
            favorites,
            total_reading_minutes,
            category_stats,
        }
    }

    /// Number of favorites that resolve to an article.
    pub fn favorite_count(&self) -> usize {
        self.favorites.len()
    }
}

// ============================================================================
// Article Detail
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDetail {
    pub article: Article,
    pub is_favorite: bool,
    pub related: Vec<Article>,
}

impl ArticleDetail {
    /// Detail view for `id`, or `None` if the store has no such article.
    pub fn build(
        id: ArticleId,
        articles: &[Article],
        prefs: &PreferenceSnapshot,
        related_limit: usize,
    ) -> Option<Self> {
        let article = articles.iter().find(|a| a.id == id)?.clone();
        let related = related(&article, articles, related_limit);
        Some(Self {
            is_favorite: prefs.favorite_ids.contains(&id),
            related,
            article,
        })
    }

    pub fn reading_time_label(&self) -> String {
        reading_time_label(self.article.reading_time)
    }

    pub fn published_label(&self) -> String {
        self.article.published_at.format("%b %-d, %Y").to_string()
    }
}

/// "1 min read" / "N mins read".
pub fn reading_time_label(minutes: u32) -> String {
    if minutes == 1 {
        "1 min read".to_string()
    } else {
        format!("{minutes} mins read")
    }
}

//! Feed filtering: search, category restriction and favorites.
//!
//! The free functions here are pure and order-preserving. [`recompute`]
//! composes them in the fixed order search → category → favorites on top of
//! a date-sorted base list. [`FilterPipeline`] keeps that result live as its
//! inputs change.

mod pipeline;

use std::collections::BTreeSet;

use crate::content::{Article, ArticleId, Category};
use crate::util::contains_ignore_case;

pub use pipeline::{FeedView, FilterPipeline, MIN_SEARCH_DEBOUNCE};

// ============================================================================
// FilterQuery
// ============================================================================

/// Snapshot of every filtering input at one recomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    /// Free-text search. Empty means no search filter.
    pub search_text: String,
    /// Explicit category pick. Overrides `preference_categories` when set.
    pub selected_category: Option<Category>,
    pub favorites_only: bool,
    /// The user's interest categories at the time of the query.
    /// Empty means no restriction.
    pub preference_categories: BTreeSet<Category>,
}

impl FilterQuery {
    /// Category restriction that applies to this query, or `None` for all.
    pub fn effective_categories(&self) -> Option<BTreeSet<Category>> {
        match self.selected_category {
            Some(category) => Some(BTreeSet::from([category])),
            None if !self.preference_categories.is_empty() => {
                Some(self.preference_categories.clone())
            }
            None => None,
        }
    }

    /// Single combined predicate equivalent to the stepwise filters.
    pub fn matches(&self, article: &Article, favorites: &BTreeSet<ArticleId>) -> bool {
        let needle = self.search_text.to_lowercase();
        let search_ok = self.search_text.is_empty() || matches_search(article, &needle);
        let category_ok = self
            .effective_categories()
            .map_or(true, |set| set.contains(&article.category));
        let favorite_ok = !self.favorites_only || favorites.contains(&article.id);
        search_ok && category_ok && favorite_ok
    }
}

// ============================================================================
// Filter Steps
// ============================================================================

/// Case-insensitive match against title, summary, author or any tag.
fn matches_search(article: &Article, needle_lower: &str) -> bool {
    contains_ignore_case(&article.title, needle_lower)
        || contains_ignore_case(&article.summary, needle_lower)
        || contains_ignore_case(&article.author, needle_lower)
        || article
            .tags
            .iter()
            .any(|tag| contains_ignore_case(tag, needle_lower))
}

/// Articles matching `query`, input order preserved. An empty query
/// returns the input unchanged.
pub fn search(articles: &[Article], query: &str) -> Vec<Article> {
    if query.is_empty() {
        return articles.to_vec();
    }
    let needle = query.to_lowercase();
    articles
        .iter()
        .filter(|a| matches_search(a, &needle))
        .cloned()
        .collect()
}

/// Articles whose category is in `categories`. An empty set means no
/// restriction and returns the input unchanged.
pub fn by_categories(articles: &[Article], categories: &BTreeSet<Category>) -> Vec<Article> {
    if categories.is_empty() {
        return articles.to_vec();
    }
    articles
        .iter()
        .filter(|a| categories.contains(&a.category))
        .cloned()
        .collect()
}

/// Articles whose id is in `favorites`.
pub fn favorites_only(articles: &[Article], favorites: &BTreeSet<ArticleId>) -> Vec<Article> {
    articles
        .iter()
        .filter(|a| favorites.contains(&a.id))
        .cloned()
        .collect()
}

/// Stable sort, newest first. Equal timestamps keep store order.
pub fn sorted_by_published(articles: &[Article]) -> Vec<Article> {
    let mut sorted = articles.to_vec();
    sorted.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    sorted
}

/// Produce the displayed list for `query` over the full article set.
///
/// The full set is sorted newest-first once; every later step only removes
/// articles, so the final list stays in date order.
pub fn recompute(
    articles: &[Article],
    query: &FilterQuery,
    favorites: &BTreeSet<ArticleId>,
) -> Vec<Article> {
    let base = sorted_by_published(articles);

    let searched = if query.search_text.is_empty() {
        base
    } else {
        search(&base, &query.search_text)
    };

    let categorized = match query.effective_categories() {
        Some(categories) => by_categories(&searched, &categories),
        None => searched,
    };

    if query.favorites_only {
        favorites_only(&categorized, favorites)
    } else {
        categorized
    }
}

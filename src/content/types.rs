use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Stable article identifier. Favorites reference articles by this id.
pub type ArticleId = i64;

// ============================================================================
// Category
// ============================================================================

/// Closed set of content topics.
///
/// Declaration order doubles as the sort order for `BTreeSet<Category>` and
/// for tie-breaking in profile statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Business,
    Science,
    Entertainment,
    Sports,
    Health,
    Politics,
    Travel,
    Lifestyle,
    Culture,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Technology,
        Category::Business,
        Category::Science,
        Category::Entertainment,
        Category::Sports,
        Category::Health,
        Category::Politics,
        Category::Travel,
        Category::Lifestyle,
        Category::Culture,
    ];

    /// Human-readable name ("Technology").
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Technology => "Technology",
            Category::Business => "Business",
            Category::Science => "Science",
            Category::Entertainment => "Entertainment",
            Category::Sports => "Sports",
            Category::Health => "Health",
            Category::Politics => "Politics",
            Category::Travel => "Travel",
            Category::Lifestyle => "Lifestyle",
            Category::Culture => "Culture",
        }
    }

    /// Storage key ("technology"). Matches the serde representation.
    pub fn key(self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Business => "business",
            Category::Science => "science",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
            Category::Health => "health",
            Category::Politics => "politics",
            Category::Travel => "travel",
            Category::Lifestyle => "lifestyle",
            Category::Culture => "culture",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category '{0}'")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    /// Accepts the storage key or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

// ============================================================================
// Article
// ============================================================================

/// One immutable content record.
///
/// String fields use `Arc<str>` so filtered result lists can clone articles
/// without copying bodies. Favorite status is not stored here; it is derived
/// from the preference state's favorite set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: ArticleId,
    pub title: Arc<str>,
    pub summary: Arc<str>,
    pub content: Arc<str>,
    pub category: Category,
    pub image_url: Option<Arc<str>>,
    pub published_at: DateTime<Utc>,
    pub source: Arc<str>,
    pub author: Arc<str>,
    /// Estimated reading time in minutes.
    pub reading_time: u32,
    pub tags: Arc<[String]>,
}

impl Article {
    /// True when this article carries at least one tag of `other`
    /// (case-sensitive equality).
    pub fn shares_tag_with(&self, other: &Article) -> bool {
        self.tags.iter().any(|tag| other.tags.contains(tag))
    }
}

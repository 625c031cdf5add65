//! User preference state layered over the key-value preference store.
//!
//! Each field lives in its own named slot. On load every slot is decoded
//! independently: a missing or corrupt slot falls back to that slot's
//! default and never fails the load as a whole. Mutations are persisted
//! before they are committed in memory, and every committed mutation is
//! published to subscribers.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::content::{ArticleId, Category};
use crate::storage::Database;

// ============================================================================
// Slot Keys
// ============================================================================

pub const SLOT_ONBOARDING: &str = "onboarding.completed";
pub const SLOT_CATEGORIES: &str = "preferences.categories";
pub const SLOT_FAVORITES: &str = "preferences.favorites";
pub const SLOT_READING_TIME: &str = "preferences.reading_time";
pub const SLOT_NAME: &str = "profile.name";

/// Interest categories for a fresh profile.
pub fn default_categories() -> BTreeSet<Category> {
    BTreeSet::from([Category::Technology, Category::Business, Category::Science])
}

// ============================================================================
// ReadingTime
// ============================================================================

/// When the user prefers to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingTime {
    Morning,
    Afternoon,
    Evening,
    #[default]
    Anytime,
}

impl ReadingTime {
    pub const ALL: [ReadingTime; 4] = [
        ReadingTime::Morning,
        ReadingTime::Afternoon,
        ReadingTime::Evening,
        ReadingTime::Anytime,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ReadingTime::Morning => "morning",
            ReadingTime::Afternoon => "afternoon",
            ReadingTime::Evening => "evening",
            ReadingTime::Anytime => "anytime",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ReadingTime::Morning => "Morning",
            ReadingTime::Afternoon => "Afternoon",
            ReadingTime::Evening => "Evening",
            ReadingTime::Anytime => "Anytime",
        }
    }
}

impl fmt::Display for ReadingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown reading time '{0}' (expected morning, afternoon, evening or anytime)")]
pub struct ParseReadingTimeError(pub String);

impl FromStr for ReadingTime {
    type Err = ParseReadingTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ReadingTime::ALL
            .into_iter()
            .find(|r| r.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseReadingTimeError(s.to_string()))
    }
}

// ============================================================================
// PreferenceSnapshot
// ============================================================================

/// Full preference record as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceSnapshot {
    /// Interest categories. Empty means no category restriction.
    pub selected_categories: BTreeSet<Category>,
    /// Favorite article ids. Weak references: ids may outlive their article.
    pub favorite_ids: BTreeSet<ArticleId>,
    pub reading_time: ReadingTime,
    pub display_name: String,
    pub onboarding_completed: bool,
}

impl Default for PreferenceSnapshot {
    fn default() -> Self {
        Self {
            selected_categories: default_categories(),
            favorite_ids: BTreeSet::new(),
            reading_time: ReadingTime::Anytime,
            display_name: String::new(),
            onboarding_completed: false,
        }
    }
}

impl PreferenceSnapshot {
    /// Decode stored slots, falling back per slot on missing or corrupt data.
    fn from_slots(slots: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();

        let selected_categories = match slots.get(SLOT_CATEGORIES) {
            Some(raw) => decode_categories(raw).unwrap_or_else(|e| {
                tracing::warn!(slot = SLOT_CATEGORIES, error = %e, "Corrupt preference slot, using default");
                defaults.selected_categories.clone()
            }),
            None => defaults.selected_categories.clone(),
        };

        let favorite_ids = match slots.get(SLOT_FAVORITES) {
            Some(raw) => serde_json::from_str::<BTreeSet<ArticleId>>(raw).unwrap_or_else(|e| {
                tracing::warn!(slot = SLOT_FAVORITES, error = %e, "Corrupt preference slot, using default");
                BTreeSet::new()
            }),
            None => BTreeSet::new(),
        };

        let reading_time = match slots.get(SLOT_READING_TIME) {
            Some(raw) => raw.parse::<ReadingTime>().unwrap_or_else(|e| {
                tracing::warn!(slot = SLOT_READING_TIME, error = %e, "Corrupt preference slot, using default");
                ReadingTime::default()
            }),
            None => ReadingTime::default(),
        };

        let onboarding_completed = match slots.get(SLOT_ONBOARDING) {
            Some(raw) => raw.parse::<bool>().unwrap_or_else(|e| {
                tracing::warn!(slot = SLOT_ONBOARDING, error = %e, "Corrupt preference slot, using default");
                false
            }),
            None => false,
        };

        let display_name = slots.get(SLOT_NAME).cloned().unwrap_or_default();

        Self {
            selected_categories,
            favorite_ids,
            reading_time,
            display_name,
            onboarding_completed,
        }
    }
}

#[derive(Debug, Error)]
enum CategorySlotError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("none of the {0} stored keys is a known category")]
    NoKnownKeys(usize),
}

/// Categories are stored as a JSON array of keys. Keys this build does not
/// know are skipped. A stored `[]` is an explicit empty choice; a non-empty
/// list with no known key at all is treated as corrupt.
fn decode_categories(raw: &str) -> Result<BTreeSet<Category>, CategorySlotError> {
    let keys: Vec<String> = serde_json::from_str(raw)?;
    let categories: BTreeSet<Category> = keys
        .iter()
        .filter_map(|key| match key.parse::<Category>() {
            Ok(category) => Some(category),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unknown stored category");
                None
            }
        })
        .collect();
    if categories.is_empty() && !keys.is_empty() {
        return Err(CategorySlotError::NoKnownKeys(keys.len()));
    }
    Ok(categories)
}

fn encode_categories(categories: &BTreeSet<Category>) -> String {
    let keys: Vec<&str> = categories.iter().map(|c| c.key()).collect();
    serde_json::to_string(&keys).unwrap_or_else(|_| "[]".to_string())
}

fn encode_favorites(favorites: &BTreeSet<ArticleId>) -> String {
    serde_json::to_string(favorites).unwrap_or_else(|_| "[]".to_string())
}

// ============================================================================
// PreferenceState
// ============================================================================

/// Live preference state backed by the preference database.
///
/// Writers are serialized by an internal lock so read-modify-write mutations
/// such as [`toggle_favorite`](Self::toggle_favorite) never interleave.
pub struct PreferenceState {
    db: Database,
    state: watch::Sender<PreferenceSnapshot>,
    writer: Mutex<()>,
}

impl PreferenceState {
    /// Load every slot from `db`. Only a failure to read the table itself is
    /// an error; bad slot contents fall back to defaults.
    pub async fn load(db: Database) -> Result<Self> {
        let slots: BTreeMap<String, String> =
            db.get_preferences_by_prefix("").await?.into_iter().collect();
        let snapshot = PreferenceSnapshot::from_slots(&slots);

        tracing::debug!(
            categories = snapshot.selected_categories.len(),
            favorites = snapshot.favorite_ids.len(),
            onboarding_completed = snapshot.onboarding_completed,
            "Loaded preferences"
        );

        let (state, _) = watch::channel(snapshot);
        Ok(Self {
            db,
            state,
            writer: Mutex::new(()),
        })
    }

    /// Subscribe to committed changes.
    pub fn subscribe(&self) -> watch::Receiver<PreferenceSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PreferenceSnapshot {
        self.state.borrow().clone()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn selected_categories(&self) -> BTreeSet<Category> {
        self.state.borrow().selected_categories.clone()
    }

    pub fn favorite_ids(&self) -> BTreeSet<ArticleId> {
        self.state.borrow().favorite_ids.clone()
    }

    pub fn is_favorite(&self, id: ArticleId) -> bool {
        self.state.borrow().favorite_ids.contains(&id)
    }

    pub fn reading_time(&self) -> ReadingTime {
        self.state.borrow().reading_time
    }

    pub fn display_name(&self) -> String {
        self.state.borrow().display_name.clone()
    }

    pub fn onboarding_completed(&self) -> bool {
        self.state.borrow().onboarding_completed
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Add `id` to favorites if absent, remove it if present. Returns the new
    /// favorite status.
    pub async fn toggle_favorite(&self, id: ArticleId) -> Result<bool> {
        let _guard = self.writer.lock().await;

        let mut favorites = self.favorite_ids();
        let now_favorite = if favorites.remove(&id) {
            false
        } else {
            favorites.insert(id);
            true
        };

        self.db
            .set_preference(SLOT_FAVORITES, &encode_favorites(&favorites))
            .await?;
        self.state.send_modify(|s| s.favorite_ids = favorites);

        tracing::debug!(article_id = id, favorite = now_favorite, "Toggled favorite");
        Ok(now_favorite)
    }

    /// Replace the interest categories. An empty set means "no restriction".
    pub async fn set_selected_categories(&self, categories: BTreeSet<Category>) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.db
            .set_preference(SLOT_CATEGORIES, &encode_categories(&categories))
            .await?;
        self.state.send_if_modified(|s| {
            if s.selected_categories == categories {
                return false;
            }
            s.selected_categories = categories;
            true
        });
        Ok(())
    }

    /// Flip one interest category. Returns whether it is now selected.
    pub async fn toggle_category(&self, category: Category) -> Result<bool> {
        let _guard = self.writer.lock().await;

        let mut categories = self.selected_categories();
        let selected = if categories.remove(&category) {
            false
        } else {
            categories.insert(category);
            true
        };

        self.db
            .set_preference(SLOT_CATEGORIES, &encode_categories(&categories))
            .await?;
        self.state.send_modify(|s| s.selected_categories = categories);
        Ok(selected)
    }

    pub async fn set_reading_time(&self, reading_time: ReadingTime) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.db
            .set_preference(SLOT_READING_TIME, reading_time.key())
            .await?;
        self.state.send_if_modified(|s| {
            let changed = s.reading_time != reading_time;
            s.reading_time = reading_time;
            changed
        });
        Ok(())
    }

    pub async fn set_display_name(&self, name: &str) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.db.set_preference(SLOT_NAME, name).await?;
        self.state.send_if_modified(|s| {
            if s.display_name == name {
                return false;
            }
            s.display_name = name.to_string();
            true
        });
        Ok(())
    }

    /// Commit the onboarding answers and mark onboarding complete, atomically.
    pub async fn complete_onboarding(
        &self,
        name: &str,
        categories: BTreeSet<Category>,
        reading_time: ReadingTime,
    ) -> Result<()> {
        let _guard = self.writer.lock().await;
        let encoded = encode_categories(&categories);
        self.db
            .set_preferences(&[
                (SLOT_NAME, name),
                (SLOT_CATEGORIES, &encoded),
                (SLOT_READING_TIME, reading_time.key()),
                (SLOT_ONBOARDING, "true"),
            ])
            .await?;
        self.state.send_modify(|s| {
            s.display_name = name.to_string();
            s.selected_categories = categories;
            s.reading_time = reading_time;
            s.onboarding_completed = true;
        });
        tracing::info!("Onboarding completed");
        Ok(())
    }

    /// Restore every slot to its default.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.writer.lock().await;
        let defaults = PreferenceSnapshot::default();
        let categories = encode_categories(&defaults.selected_categories);
        let favorites = encode_favorites(&defaults.favorite_ids);
        self.db
            .set_preferences(&[
                (SLOT_ONBOARDING, "false"),
                (SLOT_CATEGORIES, &categories),
                (SLOT_FAVORITES, &favorites),
                (SLOT_READING_TIME, defaults.reading_time.key()),
                (SLOT_NAME, ""),
            ])
            .await?;
        self.state.send_replace(defaults);
        tracing::info!("Preferences reset to defaults");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    async fn test_prefs() -> (Database, PreferenceState) {
        let db = test_db().await;
        let prefs = PreferenceState::load(db.clone()).await.unwrap();
        (db, prefs)
    }

    #[tokio::test]
    async fn test_first_run_defaults() {
        let (_db, prefs) = test_prefs().await;
        assert_eq!(prefs.selected_categories(), default_categories());
        assert!(prefs.favorite_ids().is_empty());
        assert_eq!(prefs.reading_time(), ReadingTime::Anytime);
        assert_eq!(prefs.display_name(), "");
        assert!(!prefs.onboarding_completed());
    }

    #[tokio::test]
    async fn test_toggle_favorite_is_involution() {
        let (_db, prefs) = test_prefs().await;
        prefs.toggle_favorite(2).await.unwrap();
        let before = prefs.favorite_ids();

        assert!(prefs.toggle_favorite(5).await.unwrap());
        assert!(prefs.is_favorite(5));
        assert!(!prefs.toggle_favorite(5).await.unwrap());

        assert_eq!(prefs.favorite_ids(), before);
    }

    #[tokio::test]
    async fn test_mutations_persist_immediately() {
        let (db, prefs) = test_prefs().await;
        prefs.toggle_favorite(3).await.unwrap();
        prefs
            .set_selected_categories(BTreeSet::from([Category::Health]))
            .await
            .unwrap();
        prefs.set_reading_time(ReadingTime::Evening).await.unwrap();
        prefs.set_display_name("Ada").await.unwrap();

        let reloaded = PreferenceState::load(db).await.unwrap();
        assert_eq!(reloaded.snapshot(), prefs.snapshot());
        assert_eq!(reloaded.favorite_ids(), BTreeSet::from([3]));
        assert_eq!(
            reloaded.selected_categories(),
            BTreeSet::from([Category::Health])
        );
        assert_eq!(reloaded.reading_time(), ReadingTime::Evening);
        assert_eq!(reloaded.display_name(), "Ada");
    }

    #[tokio::test]
    async fn test_empty_category_selection_persists_as_empty() {
        let (db, prefs) = test_prefs().await;
        prefs.set_selected_categories(BTreeSet::new()).await.unwrap();

        let reloaded = PreferenceState::load(db).await.unwrap();
        assert!(reloaded.selected_categories().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_category() {
        let (_db, prefs) = test_prefs().await;
        assert!(!prefs.toggle_category(Category::Science).await.unwrap());
        assert!(prefs.toggle_category(Category::Travel).await.unwrap());
        assert_eq!(
            prefs.selected_categories(),
            BTreeSet::from([Category::Technology, Category::Business, Category::Travel])
        );
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let (db, prefs) = test_prefs().await;
        prefs
            .complete_onboarding("Ada", BTreeSet::from([Category::Sports]), ReadingTime::Morning)
            .await
            .unwrap();
        prefs.toggle_favorite(1).await.unwrap();
        prefs.toggle_favorite(4).await.unwrap();

        prefs.reset().await.unwrap();

        assert_eq!(
            prefs.selected_categories(),
            BTreeSet::from([Category::Technology, Category::Business, Category::Science])
        );
        assert!(prefs.favorite_ids().is_empty());
        assert_eq!(prefs.reading_time(), ReadingTime::Anytime);
        assert!(!prefs.onboarding_completed());
        assert_eq!(prefs.display_name(), "");

        // The reset is durable too.
        let reloaded = PreferenceState::load(db).await.unwrap();
        assert_eq!(reloaded.snapshot(), PreferenceSnapshot::default());
    }

    #[tokio::test]
    async fn test_complete_onboarding_sets_all_fields() {
        let (db, prefs) = test_prefs().await;
        prefs
            .complete_onboarding(
                "Grace",
                BTreeSet::from([Category::Culture, Category::Travel]),
                ReadingTime::Afternoon,
            )
            .await
            .unwrap();

        let reloaded = PreferenceState::load(db).await.unwrap();
        assert!(reloaded.onboarding_completed());
        assert_eq!(reloaded.display_name(), "Grace");
        assert_eq!(reloaded.reading_time(), ReadingTime::Afternoon);
        assert_eq!(
            reloaded.selected_categories(),
            BTreeSet::from([Category::Culture, Category::Travel])
        );
    }

    #[tokio::test]
    async fn test_corrupt_slots_fall_back_individually() {
        let db = test_db().await;
        db.set_preference(SLOT_CATEGORIES, "not json {{").await.unwrap();
        db.set_preference(SLOT_FAVORITES, "[1, \"two\"]").await.unwrap();
        db.set_preference(SLOT_READING_TIME, "midnight").await.unwrap();
        db.set_preference(SLOT_ONBOARDING, "yes please").await.unwrap();
        // A valid slot alongside the corrupt ones is still honored.
        db.set_preference(SLOT_NAME, "Ada").await.unwrap();

        let prefs = PreferenceState::load(db).await.unwrap();
        assert_eq!(prefs.selected_categories(), default_categories());
        assert!(prefs.favorite_ids().is_empty());
        assert_eq!(prefs.reading_time(), ReadingTime::Anytime);
        assert!(!prefs.onboarding_completed());
        assert_eq!(prefs.display_name(), "Ada");
    }

    #[tokio::test]
    async fn test_unknown_category_keys_skipped() {
        let db = test_db().await;
        db.set_preference(SLOT_CATEGORIES, r#"["science","weather","Health"]"#)
            .await
            .unwrap();

        let prefs = PreferenceState::load(db).await.unwrap();
        assert_eq!(
            prefs.selected_categories(),
            BTreeSet::from([Category::Science, Category::Health])
        );
    }

    #[tokio::test]
    async fn test_all_unknown_category_keys_fall_back_to_default() {
        let db = test_db().await;
        db.set_preference(SLOT_CATEGORIES, r#"["weather","astrology"]"#)
            .await
            .unwrap();

        let prefs = PreferenceState::load(db).await.unwrap();
        assert_eq!(prefs.selected_categories(), default_categories());
    }

    #[tokio::test]
    async fn test_stored_empty_category_list_stays_empty() {
        let db = test_db().await;
        db.set_preference(SLOT_CATEGORIES, "[]").await.unwrap();

        let prefs = PreferenceState::load(db).await.unwrap();
        assert!(prefs.selected_categories().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_notified_after_commit() {
        let (_db, prefs) = test_prefs().await;
        let mut rx = prefs.subscribe();

        prefs.toggle_favorite(6).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().favorite_ids.contains(&6));
    }

    #[tokio::test]
    async fn test_unchanged_categories_do_not_notify() {
        let (_db, prefs) = test_prefs().await;
        let mut rx = prefs.subscribe();

        prefs
            .set_selected_categories(default_categories())
            .await
            .unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_reading_time_parse() {
        assert_eq!("Morning".parse::<ReadingTime>().unwrap(), ReadingTime::Morning);
        assert_eq!("anytime".parse::<ReadingTime>().unwrap(), ReadingTime::Anytime);
        assert!("noon".parse::<ReadingTime>().is_err());
    }
}

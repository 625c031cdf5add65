//! magipaper: the core of a personalized article reader.
//!
//! - [`content`] - article model and the observable [`ArticleStore`]
//! - [`preferences`] - persisted user preferences with change notification
//! - [`filter`] - search/category/favorites filtering and the debounced
//!   [`FilterPipeline`]
//! - [`related`] - related-article resolution for the detail view
//! - [`onboarding`] - first-run questionnaire
//! - [`profile`] - profile statistics and article detail
//! - [`storage`] - SQLite key-value store behind the preferences
//! - [`config`] - optional TOML configuration

pub mod config;
pub mod content;
pub mod filter;
pub mod onboarding;
pub mod preferences;
pub mod profile;
pub mod related;
pub mod storage;
pub mod util;

pub use config::Config;
pub use content::{Article, ArticleId, ArticleStore, Category};
pub use filter::{FeedView, FilterPipeline};
pub use preferences::{PreferenceSnapshot, PreferenceState, ReadingTime};

//! Article model and the store that holds the current article set.
//!
//! - [`types`] - `Article`, `Category` and the id type
//! - [`store`] - `ArticleStore`, its observable state and article sources
//! - [`sample`] - the built-in sample collection

mod sample;
mod store;
mod types;

use thiserror::Error;

pub use sample::sample_articles;
pub use store::{
    resolve_favorites, ArticleSource, ArticleStore, RefreshOutcome, SampleSource, StoreState,
};
pub use types::{Article, ArticleId, Category, ParseCategoryError};

/// Errors a source can report while loading articles.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The source could not produce articles right now; retrying may succeed.
    #[error("Articles unavailable: {0}")]
    Unavailable(String),
}

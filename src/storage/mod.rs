//! SQLite-backed key-value storage for user preferences.
//!
//! The store is deliberately opaque: it maps dotted slot names to strings
//! and knows nothing about what the values mean. Typed decoding and default
//! fallbacks live in [`crate::preferences`].

mod preferences;
mod schema;
mod types;

pub use schema::Database;
pub use types::DatabaseError;

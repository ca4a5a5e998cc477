//! Persistent store for play records, favorites, and search history.

mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::*;

use std::collections::HashMap;

/// Map key for a saved record: `"{source}+{source_id}"`.
pub fn record_key(source: &str, source_id: &str) -> String {
    format!("{}+{}", source, source_id)
}

/// Trait for record storage.
pub trait VideoStore: Send + Sync {
    /// All play records, keyed by [`record_key`].
    fn all_play_records(&self) -> Result<HashMap<String, PlayRecord>, StoreError>;

    /// Insert or fully replace a play record for its `(source, source_id)`.
    fn upsert_play_record(&self, record: &PlayRecord) -> Result<(), StoreError>;

    /// Patch title/cover/year/total_episodes on an existing play record.
    fn update_play_record(&self, record: &PlayRecord) -> Result<(), StoreError>;

    fn delete_play_record(&self, source: &str, source_id: &str) -> Result<(), StoreError>;

    fn delete_all_play_records(&self) -> Result<(), StoreError>;

    /// All favorites, keyed by [`record_key`].
    fn all_favorites(&self) -> Result<HashMap<String, Favorite>, StoreError>;

    /// Insert or fully replace a favorite for its `(source, source_id)`.
    fn upsert_favorite(&self, favorite: &Favorite) -> Result<(), StoreError>;

    /// Patch title/cover/year/total_episodes on an existing favorite.
    fn update_favorite(&self, favorite: &Favorite) -> Result<(), StoreError>;

    fn delete_favorite(&self, source: &str, source_id: &str) -> Result<(), StoreError>;

    /// Search history keywords, most recent first.
    fn search_history(&self) -> Result<Vec<String>, StoreError>;

    /// Move `keyword` to the front of the history (inserting if new) and
    /// return the updated list. Atomic: concurrent pushes never lose
    /// keywords.
    fn push_search_history(&self, keyword: &str) -> Result<Vec<String>, StoreError>;

    /// Remove every occurrence of `keyword` from the history.
    fn delete_search_history_keyword(&self, keyword: &str) -> Result<(), StoreError>;
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the user left off in one title on one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRecord {
    pub title: String,
    pub source: String,
    pub source_id: String,
    pub source_name: String,
    pub cover: String,
    pub year: String,
    #[serde(rename = "index")]
    pub index_number: i64,
    pub total_episodes: i64,
    pub play_time: i64,
    pub total_time: i64,
    pub save_time: i64,
    pub search_title: String,
}

/// A bookmarked title on one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub source: String,
    pub source_id: String,
    pub source_name: String,
    pub total_episodes: i64,
    pub title: String,
    pub year: String,
    pub cover: String,
    pub save_time: i64,
    pub search_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

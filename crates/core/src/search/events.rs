//! Events emitted over the streaming search channel.

use chrono::Utc;
use serde::Serialize;

use crate::registry::ApiSite;
use crate::upstream::VideoResult;

/// One streaming search event, serialized as the SSE `data` payload.
///
/// A stream carries exactly one `start`, one terminal event per source
/// (`source_result` or `source_error`), and one final `complete`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    Start {
        query: String,
        #[serde(rename = "totalSources")]
        total_sources: usize,
        timestamp: i64,
    },
    SourceResult {
        source: String,
        #[serde(rename = "sourceName")]
        source_name: String,
        results: Vec<VideoResult>,
        timestamp: i64,
    },
    SourceError {
        source: String,
        #[serde(rename = "sourceName")]
        source_name: String,
        error: String,
        timestamp: i64,
    },
    Complete {
        #[serde(rename = "totalResults")]
        total_results: usize,
        #[serde(rename = "completedSources")]
        completed_sources: usize,
        timestamp: i64,
    },
}

impl SearchEvent {
    pub fn start(query: &str, total_sources: usize) -> Self {
        Self::Start {
            query: query.to_string(),
            total_sources,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn source_result(site: &ApiSite, results: Vec<VideoResult>) -> Self {
        Self::SourceResult {
            source: site.key.clone(),
            source_name: site.name.clone(),
            results,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn source_error(site: &ApiSite, error: String) -> Self {
        Self::SourceError {
            source: site.key.clone(),
            source_name: site.name.clone(),
            error,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn complete(total_results: usize, completed_sources: usize) -> Self {
        Self::Complete {
            total_results,
            completed_sources,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_event_shape() {
        let value = serde_json::to_value(SearchEvent::start("hero", 3)).unwrap();
        assert_eq!(value["type"], "start");
        assert_eq!(value["query"], "hero");
        assert_eq!(value["totalSources"], 3);
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_source_error_event_shape() {
        let site = ApiSite {
            key: "a".to_string(),
            name: "Alpha".to_string(),
            api: String::new(),
            detail: String::new(),
        };
        let value =
            serde_json::to_value(SearchEvent::source_error(&site, "boom".to_string())).unwrap();
        assert_eq!(value["type"], "source_error");
        assert_eq!(value["source"], "a");
        assert_eq!(value["sourceName"], "Alpha");
        assert_eq!(value["error"], "boom");
    }

    #[test]
    fn test_complete_event_shape() {
        let value = serde_json::to_value(SearchEvent::complete(12, 4)).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["totalResults"], 12);
        assert_eq!(value["completedSources"], 4);
    }
}

//! Short-lived in-process cache for per-(source, query, page) outcomes.
//!
//! Negative outcomes (`forbidden`, `timeout`) are cached alongside
//! successful pages so that a misbehaving upstream is not re-queried on
//! every request. Entries expire after [`CACHE_TTL`]; the write path
//! sweeps expired entries at most once per [`SWEEP_INTERVAL`] and evicts
//! the earliest-expiring entries when the map grows past [`MAX_ENTRIES`].

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::upstream::VideoResult;

/// How long a cached page stays valid.
pub const CACHE_TTL: Duration = Duration::minutes(10);
/// Minimum interval between expiry sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::minutes(5);
/// Upper bound on cached pages before earliest-expiry eviction kicks in.
pub const MAX_ENTRIES: usize = 1000;

/// Outcome of one upstream page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Ok,
    Forbidden,
    Timeout,
}

/// One cached search page, positive or negative.
#[derive(Debug, Clone)]
pub struct CachedSearchPage {
    pub status: PageStatus,
    pub data: Vec<VideoResult>,
    /// Total page count reported by the upstream, first page only.
    pub page_count: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

struct CacheInner {
    entries: HashMap<String, CachedSearchPage>,
    last_sweep: DateTime<Utc>,
}

/// Many-reader / single-writer page cache.
pub struct SearchCache {
    inner: RwLock<CacheInner>,
    ttl: Duration,
    sweep_interval: Duration,
    max_entries: usize,
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchCache {
    pub fn new() -> Self {
        Self::with_limits(CACHE_TTL, SWEEP_INTERVAL, MAX_ENTRIES)
    }

    /// Custom limits, used by tests.
    pub fn with_limits(ttl: Duration, sweep_interval: Duration, max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                last_sweep: Utc::now(),
            }),
            ttl,
            sweep_interval,
            max_entries,
        }
    }

    /// Cache key for a (source, query, page) triple.
    pub fn key(site_key: &str, query: &str, page: u32) -> String {
        format!("{}:{}:{}", site_key, query, page)
    }

    /// Look up a page. An entry past its `expires_at` counts as a miss
    /// and is removed lazily.
    pub fn get(&self, key: &str) -> Option<CachedSearchPage> {
        let now = Utc::now();
        {
            let inner = self.inner.read().expect("cache lock poisoned");
            match inner.entries.get(key) {
                Some(entry) if now < entry.expires_at => return Some(entry.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: upgrade to a write lock and drop it.
        let mut inner = self.inner.write().expect("cache lock poisoned");
        if let Some(entry) = inner.entries.get(key) {
            if now >= entry.expires_at {
                inner.entries.remove(key);
            }
        }
        None
    }

    /// Store a page outcome under the given key.
    pub fn set(
        &self,
        key: String,
        status: PageStatus,
        data: Vec<VideoResult>,
        page_count: Option<u32>,
    ) {
        let now = Utc::now();
        let entry = CachedSearchPage {
            status,
            data,
            page_count,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut inner = self.inner.write().expect("cache lock poisoned");
        inner.entries.insert(key, entry);

        if now - inner.last_sweep >= self.sweep_interval {
            inner.last_sweep = now;
            inner.entries.retain(|_, e| now < e.expires_at);

            if inner.entries.len() > self.max_entries {
                let mut by_expiry: Vec<(String, DateTime<Utc>)> = inner
                    .entries
                    .iter()
                    .map(|(k, e)| (k.clone(), e.expires_at))
                    .collect();
                by_expiry.sort_by_key(|(_, expires_at)| *expires_at);

                let excess = inner.entries.len() - self.max_entries;
                for (key, _) in by_expiry.into_iter().take(excess) {
                    inner.entries.remove(&key);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_ttl(ttl: Duration) -> SearchCache {
        SearchCache::with_limits(ttl, SWEEP_INTERVAL, MAX_ENTRIES)
    }

    #[test]
    fn test_key_format() {
        assert_eq!(SearchCache::key("site", "query", 2), "site:query:2");
    }

    #[test]
    fn test_set_and_get() {
        let cache = SearchCache::new();
        cache.set("a:q:1".to_string(), PageStatus::Ok, vec![], Some(3));

        let entry = cache.get("a:q:1").unwrap();
        assert_eq!(entry.status, PageStatus::Ok);
        assert_eq!(entry.page_count, Some(3));
        assert_eq!(entry.expires_at, entry.created_at + CACHE_TTL);
    }

    #[test]
    fn test_negative_status_cached() {
        let cache = SearchCache::new();
        cache.set("a:q:1".to_string(), PageStatus::Forbidden, vec![], None);
        assert_eq!(cache.get("a:q:1").unwrap().status, PageStatus::Forbidden);
    }

    #[test]
    fn test_expired_entry_is_miss_and_removed() {
        let cache = cache_with_ttl(Duration::zero());
        cache.set("a:q:1".to_string(), PageStatus::Ok, vec![], None);

        assert!(cache.get("a:q:1").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let cache = SearchCache::new();
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn test_sweep_evicts_earliest_expiry_over_capacity() {
        // Sweep on every write, capacity 2, entries never expire naturally.
        let cache = SearchCache::with_limits(Duration::hours(1), Duration::zero(), 2);

        cache.set("k1".to_string(), PageStatus::Ok, vec![], None);
        cache.set("k2".to_string(), PageStatus::Ok, vec![], None);
        cache.set("k3".to_string(), PageStatus::Ok, vec![], None);

        assert_eq!(cache.len(), 2);
        // k1 had the earliest expiry so it is the one evicted.
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k3").is_some());
    }
}

//! Hourly background refresh of the subscription config and saved records.
//!
//! Each tick re-fetches the subscription, then re-resolves every saved
//! `(source, source_id)` pair and patches the stored metadata when the
//! upstream episode count has moved. Per-record failures are logged and
//! skipped; the job itself never stops ticking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::registry::SourceRegistry;
use crate::search::VideoResolver;
use crate::store::{Favorite, PlayRecord, VideoStore};
use crate::upstream::VideoResult;

/// Interval between refresh runs.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(3600);
/// Concurrent detail lookups per run.
const MAX_CONCURRENT_LOOKUPS: usize = 10;

/// Periodic job keeping stored records in sync with the upstreams.
pub struct RefreshJob {
    registry: Arc<SourceRegistry>,
    resolver: Arc<dyn VideoResolver>,
    store: Arc<dyn VideoStore>,
}

impl RefreshJob {
    pub fn new(
        registry: Arc<SourceRegistry>,
        resolver: Arc<dyn VideoResolver>,
        store: Arc<dyn VideoStore>,
    ) -> Self {
        Self {
            registry,
            resolver,
            store,
        }
    }

    /// Run forever: one run immediately, then one per [`REFRESH_INTERVAL`].
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// One full refresh pass.
    pub async fn run_once(&self) {
        info!("refresh run started");

        if let Err(e) = self.registry.refresh().await {
            warn!(error = %e, "subscription refresh failed, keeping current sites");
        }

        if let Err(e) = self.refresh_records().await {
            warn!(error = %e, "record refresh failed");
        }

        info!("refresh run finished");
    }

    async fn refresh_records(&self) -> Result<(), crate::store::StoreError> {
        let play_records = self.store.all_play_records()?;
        let favorites = self.store.all_favorites()?;

        let mut keys: Vec<String> = play_records.keys().cloned().collect();
        for key in favorites.keys() {
            if !play_records.contains_key(key) {
                keys.push(key.clone());
            }
        }
        info!(records = keys.len(), "refreshing saved records");

        let details = self
            .fetch_details(&keys, &play_records, &favorites)
            .await;

        let mut updated = 0usize;
        for (key, record) in &play_records {
            let Some(detail) = details.get(key) else { continue };
            if detail.episodes.len() as i64 != record.total_episodes {
                let patched = patched_play_record(record, detail);
                match self.store.update_play_record(&patched) {
                    Ok(()) => updated += 1,
                    Err(e) => warn!(key, error = %e, "play record update failed"),
                }
            }
        }
        for (key, favorite) in &favorites {
            let Some(detail) = details.get(key) else { continue };
            if detail.episodes.len() as i64 != favorite.total_episodes {
                let patched = patched_favorite(favorite, detail);
                match self.store.update_favorite(&patched) {
                    Ok(()) => updated += 1,
                    Err(e) => warn!(key, error = %e, "favorite update failed"),
                }
            }
        }

        info!(updated, "record refresh complete");
        Ok(())
    }

    /// Resolve the details for every key, play record preferred as the
    /// reference, at most [`MAX_CONCURRENT_LOOKUPS`] in flight.
    async fn fetch_details(
        &self,
        keys: &[String],
        play_records: &HashMap<String, PlayRecord>,
        favorites: &HashMap<String, Favorite>,
    ) -> HashMap<String, VideoResult> {
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_LOOKUPS));
        let mut tasks = JoinSet::new();

        for key in keys {
            let (source, source_id, title) = if let Some(record) = play_records.get(key) {
                (
                    record.source.clone(),
                    record.source_id.clone(),
                    record.title.clone(),
                )
            } else if let Some(favorite) = favorites.get(key) {
                (
                    favorite.source.clone(),
                    favorite.source_id.clone(),
                    favorite.title.clone(),
                )
            } else {
                continue;
            };

            let key = key.clone();
            let resolver = Arc::clone(&self.resolver);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let outcome = resolver.resolve(&source, &source_id, &title).await;
                (key, outcome)
            });
        }

        let mut details = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let Ok((key, outcome)) = joined else { continue };
            match outcome {
                Ok(detail) => {
                    details.insert(key, detail);
                }
                Err(e) => debug!(key, error = %e, "detail lookup failed, record skipped"),
            }
        }
        details
    }
}

fn patched_play_record(record: &PlayRecord, detail: &VideoResult) -> PlayRecord {
    let mut patched = record.clone();
    patched.total_episodes = detail.episodes.len() as i64;
    patched.title = detail.title.clone();
    patched.cover = detail.poster.clone();
    patched.year = detail.year.clone();
    patched
}

fn patched_favorite(favorite: &Favorite, detail: &VideoResult) -> Favorite {
    let mut patched = favorite.clone();
    patched.total_episodes = detail.episodes.len() as i64;
    patched.title = detail.title.clone();
    patched.cover = detail.poster.clone();
    patched.year = detail.year.clone();
    patched
}

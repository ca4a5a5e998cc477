use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::warn;

use crate::filter::filter_adult_content;
use crate::registry::{ApiSite, SourceRegistry};
use crate::upstream::{UpstreamClient, VideoResult};

use super::SearchEvent;

/// Upper bound on search pages fetched per site.
pub const MAX_SEARCH_PAGES: u32 = 5;
/// Overall deadline for one site, all pages included.
pub const SITE_TIMEOUT: Duration = Duration::from_secs(20);

/// Fans a query out to every registered site and aggregates the results.
pub struct SearchService {
    registry: Arc<SourceRegistry>,
    client: Arc<UpstreamClient>,
}

impl SearchService {
    pub fn new(registry: Arc<SourceRegistry>, client: Arc<UpstreamClient>) -> Self {
        Self { registry, client }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn client(&self) -> &Arc<UpstreamClient> {
        &self.client
    }

    /// Search every site and return the merged, filtered result list.
    ///
    /// Sites that fail or exceed [`SITE_TIMEOUT`] contribute nothing;
    /// batch search never fails as a whole.
    pub async fn search_all(&self, query: &str) -> Vec<VideoResult> {
        let sites = self.registry.snapshot();
        let fetches = sites.values().map(|site| async move {
            match timeout(SITE_TIMEOUT, self.client.search_site(site, query, MAX_SEARCH_PAGES))
                .await
            {
                Ok(Ok(results)) => results,
                Ok(Err(e)) => {
                    warn!(site = %site.key, error = %e, "site search failed");
                    Vec::new()
                }
                Err(_) => {
                    warn!(site = %site.key, "site search timed out");
                    Vec::new()
                }
            }
        });

        let merged: Vec<VideoResult> = join_all(fetches).await.into_iter().flatten().collect();
        filter_adult_content(merged)
    }

    /// Search every site, emitting progress events as sources finish.
    ///
    /// The returned channel yields one `start` event, then exactly one
    /// `source_result` or `source_error` per site in completion order,
    /// then one `complete`. Dropping the receiver aborts the in-flight
    /// site fetches.
    pub fn search_stream(self: &Arc<Self>, query: &str) -> mpsc::Receiver<SearchEvent> {
        let (tx, rx) = mpsc::channel(64);
        let sites: Vec<ApiSite> = self.registry.snapshot().values().cloned().collect();
        let service = Arc::clone(self);
        let query = query.to_string();

        tokio::spawn(async move {
            if tx.send(SearchEvent::start(&query, sites.len())).await.is_err() {
                return;
            }

            let mut tasks = JoinSet::new();
            for site in sites {
                let service = Arc::clone(&service);
                let query = query.clone();
                let tx = tx.clone();

                tasks.spawn(async move {
                    let outcome = timeout(
                        SITE_TIMEOUT,
                        service.client.search_site(&site, &query, MAX_SEARCH_PAGES),
                    )
                    .await;

                    let (event, count) = match outcome {
                        Ok(Ok(results)) => {
                            let filtered = filter_adult_content(results);
                            let count = filtered.len();
                            (SearchEvent::source_result(&site, filtered), count)
                        }
                        Ok(Err(e)) => (SearchEvent::source_error(&site, e.to_string()), 0),
                        Err(_) => (
                            SearchEvent::source_error(&site, "search timed out".to_string()),
                            0,
                        ),
                    };

                    // Send failures mean the client went away; nothing to do.
                    let _ = tx.send(event).await;
                    count
                });
            }

            let mut total_results = 0;
            let mut completed_sources = 0;
            loop {
                let joined = tokio::select! {
                    joined = tasks.join_next() => joined,
                    // Receiver gone: stop the in-flight site fetches.
                    _ = tx.closed() => {
                        tasks.abort_all();
                        return;
                    }
                };
                match joined {
                    Some(joined) => {
                        completed_sources += 1;
                        if let Ok(count) = joined {
                            total_results += count;
                        }
                    }
                    None => break,
                }
            }

            let _ = tx
                .send(SearchEvent::complete(total_results, completed_sources))
                .await;
        });

        rx
    }
}

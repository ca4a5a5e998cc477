use async_trait::async_trait;
use tracing::debug;

use crate::upstream::VideoResult;

use super::{SearchError, SearchService, MAX_SEARCH_PAGES};

/// Resolves one `(source, id)` pair to a full video detail.
///
/// Trait seam so the refresh job can be tested against a canned resolver.
#[async_trait]
pub trait VideoResolver: Send + Sync {
    async fn resolve(
        &self,
        source: &str,
        id: &str,
        fallback_title: &str,
    ) -> Result<VideoResult, SearchError>;
}

#[async_trait]
impl VideoResolver for SearchService {
    /// Resolve via exact search match when a title is known, falling back
    /// to the detail endpoint. The search path hits the page cache, so
    /// repeated lookups of the same title stay cheap.
    async fn resolve(
        &self,
        source: &str,
        id: &str,
        fallback_title: &str,
    ) -> Result<VideoResult, SearchError> {
        let site = self
            .registry()
            .get(source)
            .ok_or_else(|| SearchError::UnknownSource(source.to_string()))?;

        if !fallback_title.is_empty() {
            match self
                .client()
                .search_site(&site, fallback_title, MAX_SEARCH_PAGES)
                .await
            {
                Ok(results) => {
                    if let Some(exact) = results
                        .into_iter()
                        .find(|r| r.source == source && r.id == id)
                    {
                        return Ok(exact);
                    }
                }
                Err(e) => {
                    debug!(source, error = %e, "title search failed, using detail endpoint");
                }
            }
        }

        Ok(self.client().fetch_detail(&site, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::cache::SearchCache;
    use crate::registry::SourceRegistry;
    use crate::upstream::UpstreamClient;

    #[tokio::test]
    async fn test_resolve_unknown_source() {
        let registry = Arc::new(SourceRegistry::new("http://unused"));
        registry.install(HashMap::new());
        let client = Arc::new(UpstreamClient::new(Arc::new(SearchCache::new())));
        let service = SearchService::new(registry, client);

        let err = service.resolve("ghost", "1", "").await.unwrap_err();
        assert!(matches!(err, SearchError::UnknownSource(_)));
    }
}

use std::sync::Arc;

use helios_core::{Credentials, SearchService, SourceRegistry, UpstreamClient, VideoStore};

/// Shared application state
pub struct AppState {
    search: Arc<SearchService>,
    registry: Arc<SourceRegistry>,
    store: Arc<dyn VideoStore>,
    credentials: Credentials,
}

impl AppState {
    pub fn new(
        search: Arc<SearchService>,
        registry: Arc<SourceRegistry>,
        store: Arc<dyn VideoStore>,
        credentials: Credentials,
    ) -> Self {
        Self {
            search,
            registry,
            store,
            credentials,
        }
    }

    pub fn search(&self) -> &Arc<SearchService> {
        &self.search
    }

    pub fn client(&self) -> &Arc<UpstreamClient> {
        self.search.client()
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn VideoStore {
        self.store.as_ref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

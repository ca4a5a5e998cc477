//! Registry of configured upstream catalog sites.
//!
//! The site list comes from an external subscription URL serving a
//! base58-encoded JSON blob. The decoded config is stamped into an
//! immutable snapshot; readers clone the current `Arc` and keep working
//! against it even while the hourly refresh swaps in a replacement.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// One upstream catalog endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSite {
    /// Stable id, stamped from the subscription map key; used as the
    /// cache key prefix and the `source` tag on results.
    #[serde(default)]
    pub key: String,
    pub name: String,
    /// Base URL for the JSON search/detail endpoints.
    pub api: String,
    /// Optional base URL of an HTML detail page; non-empty switches the
    /// detail resolver to the scraping path.
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionConfig {
    api_site: HashMap<String, ApiSite>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("subscription request failed: {0}")]
    Request(String),

    #[error("subscription request failed with status: {0}")]
    HttpStatus(u16),

    #[error("failed to decode base58 payload")]
    Base58,

    #[error("failed to parse subscription config: {0}")]
    Parse(String),

    #[error("no API sites found in subscription")]
    Empty,
}

/// Process-wide snapshot of configured sites.
pub struct SourceRegistry {
    http: reqwest::Client,
    subscription_url: String,
    sites: RwLock<Arc<HashMap<String, ApiSite>>>,
}

impl SourceRegistry {
    /// Create an empty registry; call [`SourceRegistry::refresh`] to
    /// populate it.
    pub fn new(subscription_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            subscription_url: subscription_url.into(),
            sites: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Fetch the subscription feed and atomically replace the snapshot.
    pub async fn refresh(&self) -> Result<(), RegistryError> {
        let response = self
            .http
            .get(&self.subscription_url)
            .send()
            .await
            .map_err(|e| RegistryError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RegistryError::HttpStatus(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::Request(e.to_string()))?;

        let sites = parse_subscription(&body)?;
        info!(sites = sites.len(), "subscription config loaded");

        let mut current = self.sites.write().expect("registry lock poisoned");
        *current = Arc::new(sites);
        Ok(())
    }

    /// Replace the snapshot directly. Used by tests and fixtures.
    pub fn install(&self, sites: HashMap<String, ApiSite>) {
        let mut current = self.sites.write().expect("registry lock poisoned");
        *current = Arc::new(sites);
    }

    /// Current snapshot. In-flight work holding a previous snapshot is
    /// unaffected by later refreshes.
    pub fn snapshot(&self) -> Arc<HashMap<String, ApiSite>> {
        Arc::clone(&self.sites.read().expect("registry lock poisoned"))
    }

    /// Look up one site by key in the current snapshot.
    pub fn get(&self, key: &str) -> Option<ApiSite> {
        self.snapshot().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

/// Decode a base58-encoded JSON subscription payload into a keyed site
/// map, stamping each site's `key` from its map key.
pub fn parse_subscription(body: &str) -> Result<HashMap<String, ApiSite>, RegistryError> {
    let decoded = bs58::decode(body.trim())
        .into_vec()
        .map_err(|_| RegistryError::Base58)?;
    if decoded.is_empty() {
        return Err(RegistryError::Base58);
    }

    let config: SubscriptionConfig =
        serde_json::from_slice(&decoded).map_err(|e| RegistryError::Parse(e.to_string()))?;

    if config.api_site.is_empty() {
        return Err(RegistryError::Empty);
    }

    let mut sites = config.api_site;
    for (key, site) in sites.iter_mut() {
        site.key = key.clone();
    }
    Ok(sites)
}

//! Federated search across all configured upstream sites.

mod events;
mod resolver;
mod service;

pub use events::SearchEvent;
pub use resolver::VideoResolver;
pub use service::{SearchService, MAX_SEARCH_PAGES, SITE_TIMEOUT};

use thiserror::Error;

use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

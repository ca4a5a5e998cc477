//! HTTP client for the upstream catalog sites and the types they serve.

mod client;
mod types;

pub use client::{UpstreamClient, DETAIL_TIMEOUT, PAGE_TIMEOUT};
pub use types::{decode_search_body, ApiDetailResponse, ApiSearchItem, UpstreamError, VideoResult};

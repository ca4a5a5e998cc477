pub mod detail;
pub mod favorites;
pub mod login;
pub mod middleware;
pub mod play_records;
pub mod routes;
pub mod search;
pub mod search_history;

pub use routes::create_router;

use axum::http::{header, HeaderName, HeaderValue};
use serde::Serialize;

/// Cache headers telling the CDN to hold cacheable responses for 2 hours.
pub(crate) fn cdn_cache_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=7200, s-maxage=7200"),
        ),
        (
            HeaderName::from_static("cdn-cache-control"),
            HeaderValue::from_static("public, s-maxage=7200"),
        ),
        (
            HeaderName::from_static("vercel-cdn-cache-control"),
            HeaderValue::from_static("public, s-maxage=7200"),
        ),
        (
            HeaderName::from_static("netlify-vary"),
            HeaderValue::from_static("query"),
        ),
    ]
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of every successful mutation endpoint.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

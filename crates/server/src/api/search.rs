//! Batch and streaming search endpoints.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use helios_core::VideoResult;

use super::{cdn_cache_headers, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub results: Vec<VideoResult>,
}

/// Batch search: fan the query out to every source and merge.
///
/// An empty query is a cacheable empty response; a query with no hits is
/// returned without cache headers so the CDN retries it later.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    if params.q.is_empty() {
        return (cdn_cache_headers(), Json(SearchResults { results: vec![] })).into_response();
    }

    let results = state.search().search_all(&params.q).await;
    if results.is_empty() {
        return Json(SearchResults { results }).into_response();
    }

    (cdn_cache_headers(), Json(SearchResults { results })).into_response()
}

/// Streaming search, emitting per-source results over SSE.
pub async fn search_stream(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    if params.q.is_empty() {
        let error = serde_json::to_string(&ErrorResponse::new("search query must not be empty"))
            .unwrap_or_default();
        return (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "text/event-stream")],
            format!("data: {}\n\n", error),
        )
            .into_response();
    }

    if state.registry().is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("No API sites configured")),
        )
            .into_response();
    }

    let rx = state.search().search_stream(&params.q);
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        let data = serde_json::to_string(&event).unwrap_or_default();
        Some((Ok::<Event, Infallible>(Event::default().data(data)), rx))
    });

    Sse::new(stream).into_response()
}

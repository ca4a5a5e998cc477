use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{cdn_cache_headers, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DetailParams {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
}

/// Resolve one video's detail from its source.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DetailParams>,
) -> Response {
    if params.id.is_empty() || params.source.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("id and source parameters are required")),
        )
            .into_response();
    }

    if !is_valid_id(&params.id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("invalid video id format")),
        )
            .into_response();
    }

    let Some(site) = state.registry().get(&params.source) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("unknown source")),
        )
            .into_response();
    };

    match state.client().fetch_detail(&site, &params.id).await {
        Ok(result) => (cdn_cache_headers(), Json(result)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response(),
    }
}

/// Upstream ids are word characters and dashes only.
fn is_valid_id(id: &str) -> bool {
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

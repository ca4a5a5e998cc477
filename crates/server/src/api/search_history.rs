use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{ErrorResponse, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KeywordRequest {
    #[serde(default)]
    pub keyword: String,
}

/// Return the keyword list, most recent first.
pub async fn get_history(State(state): State<Arc<AppState>>) -> Response {
    match state.store().search_history() {
        Ok(keywords) => Json(keywords).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!(
                "Failed to get search history: {}",
                e
            ))),
        )
            .into_response(),
    }
}

/// Push a keyword to the front of the history and return the updated
/// list.
pub async fn post_keyword(
    State(state): State<Arc<AppState>>,
    Json(request): Json<KeywordRequest>,
) -> Response {
    if request.keyword.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("keyword parameter is required")),
        )
            .into_response();
    }

    match state.store().push_search_history(&request.keyword) {
        Ok(keywords) => Json(keywords).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!(
                "Failed to update search history: {}",
                e
            ))),
        )
            .into_response(),
    }
}

/// Drop one keyword from the history.
pub async fn delete_keyword(
    State(state): State<Arc<AppState>>,
    Query(params): Query<KeywordRequest>,
) -> Response {
    if params.keyword.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("keyword parameter is required")),
        )
            .into_response();
    }

    match state.store().delete_search_history_keyword(&params.keyword) {
        Ok(()) => Json(SuccessResponse::ok()).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!(
                "Failed to delete search history keyword: {}",
                e
            ))),
        )
            .into_response(),
    }
}

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use helios_core::Favorite;

use super::{ErrorResponse, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FavoritePostRequest {
    pub key: String,
    pub favorite: Favorite,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub key: String,
}

/// Split a `"source+source_id"` key into its two parts.
pub(crate) fn split_key(key: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = key.split('+').collect();
    match parts.as_slice() {
        [source, source_id] => Some((source, source_id)),
        _ => None,
    }
}

/// List all favorites, keyed by `"source+source_id"`.
pub async fn get_favorites(State(state): State<Arc<AppState>>) -> Response {
    match state.store().all_favorites() {
        Ok(favorites) => Json(favorites).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to get favorites: {}", e))),
        )
            .into_response(),
    }
}

/// Upsert one favorite under its key.
pub async fn post_favorite(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<FavoritePostRequest>,
) -> Response {
    let Some((source, source_id)) = split_key(&request.key) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Invalid key format. Expected format: source+source_id",
            )),
        )
            .into_response();
    };

    // The key is authoritative over whatever the body carries.
    request.favorite.source = source.to_string();
    request.favorite.source_id = source_id.to_string();

    match state.store().upsert_favorite(&request.favorite) {
        Ok(()) => Json(SuccessResponse::ok()).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to upsert favorite: {}", e))),
        )
            .into_response(),
    }
}

/// Remove one favorite. Deleting an absent key succeeds.
pub async fn delete_favorite(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteParams>,
) -> Response {
    if params.key.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("key parameter is required")),
        )
            .into_response();
    }

    let Some((source, source_id)) = split_key(&params.key) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Invalid key format. Expected format: source+source_id",
            )),
        )
            .into_response();
    };

    match state.store().delete_favorite(source, source_id) {
        Ok(()) => Json(SuccessResponse::ok()).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to delete favorite: {}", e))),
        )
            .into_response(),
    }
}

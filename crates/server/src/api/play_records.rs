use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use helios_core::PlayRecord;

use super::favorites::split_key;
use super::{ErrorResponse, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PlayRecordPostRequest {
    pub key: String,
    pub record: PlayRecord,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub key: String,
}

/// List all play records, keyed by `"source+source_id"`.
pub async fn get_play_records(State(state): State<Arc<AppState>>) -> Response {
    match state.store().all_play_records() {
        Ok(records) => Json(records).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!(
                "Failed to get play records: {}",
                e
            ))),
        )
            .into_response(),
    }
}

/// Upsert one play record under its key.
pub async fn post_play_record(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<PlayRecordPostRequest>,
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

    request.record.source = source.to_string();
    request.record.source_id = source_id.to_string();

    match state.store().upsert_play_record(&request.record) {
        Ok(()) => Json(SuccessResponse::ok()).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!(
                "Failed to upsert play record: {}",
                e
            ))),
        )
            .into_response(),
    }
}

/// Remove one play record, or every record when no key is given.
pub async fn delete_play_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteParams>,
) -> Response {
    if params.key.is_empty() {
        return match state.store().delete_all_play_records() {
            Ok(()) => Json(SuccessResponse::ok()).into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(format!(
                    "Failed to delete all play records: {}",
                    e
                ))),
            )
                .into_response(),
        };
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

    match state.store().delete_play_record(source, source_id) {
        Ok(()) => Json(SuccessResponse::ok()).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!(
                "Failed to delete play record: {}",
                e
            ))),
        )
            .into_response(),
    }
}

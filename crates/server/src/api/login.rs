use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::middleware::AuthInfo;
use super::ErrorResponse;
use crate::state::AppState;

const COOKIE_MAX_AGE_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub ok: bool,
}

/// Verify the owner credentials and set the auth cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    if request.username.is_empty() || request.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Username and password are required")),
        )
            .into_response();
    }

    let credentials = state.credentials();
    if request.username != credentials.username || request.password != credentials.password {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid credentials")),
        )
            .into_response();
    }

    let auth_info = AuthInfo {
        role: "owner".to_string(),
        username: request.username,
        password: request.password,
    };
    let auth_json = serde_json::to_string(&auth_info).unwrap_or_default();
    let cookie_value = urlencoding::encode(&urlencoding::encode(&auth_json)).into_owned();

    let expires = (Utc::now() + Duration::days(COOKIE_MAX_AGE_DAYS))
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();
    let cookie = format!(
        "auth={}; Path=/; Expires={}; SameSite=Lax",
        cookie_value, expires
    );

    (
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse { ok: true }),
    )
        .into_response()
}

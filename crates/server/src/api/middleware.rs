//! Cookie authentication middleware.
//!
//! Clients carry an `auth` cookie whose value is the JSON auth blob,
//! URL-encoded twice. The credentials inside must match the configured
//! owner account exactly.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// Contents of the `auth` cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthInfo {
    pub role: String,
    pub username: String,
    pub password: String,
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let cookie_header = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let raw = auth_cookie_value(cookie_header).ok_or(StatusCode::UNAUTHORIZED)?;
    let auth_info = decode_auth_cookie(raw).ok_or(StatusCode::UNAUTHORIZED)?;

    let credentials = state.credentials();
    if auth_info.username != credentials.username || auth_info.password != credentials.password {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

fn auth_cookie_value(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("auth="))
}

fn decode_auth_cookie(raw: &str) -> Option<AuthInfo> {
    let once = urlencoding::decode(raw).ok()?;
    let twice = urlencoding::decode(&once).ok()?;
    serde_json::from_str(&twice).ok()
}

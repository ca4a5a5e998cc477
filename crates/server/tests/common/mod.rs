//! Common test utilities for E2E testing against a fake upstream.
//!
//! Provides an in-process router wired to a local HTTP server that plays
//! the role of the upstream catalog sites, so the full request path
//! (auth, fan-out, filtering, caching, persistence) runs without any
//! external infrastructure.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use helios_core::{
    ApiSite, Credentials, SearchCache, SearchService, SourceRegistry, SqliteStore, UpstreamClient,
    VideoStore,
};
use helios_server::api::create_router;
use helios_server::state::AppState;

pub const TEST_USERNAME: &str = "admin";
pub const TEST_PASSWORD: &str = "s3cret";

/// Test fixture running the router in-process against a fake upstream.
pub struct TestFixture {
    pub router: Router,
    #[allow(dead_code)]
    pub store: Arc<SqliteStore>,
    pub registry: Arc<SourceRegistry>,
    pub upstream_addr: SocketAddr,
    #[allow(dead_code)]
    temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub raw_body: String,
    pub headers: axum::http::HeaderMap,
}

impl TestFixture {
    /// Fixture with no sites registered; add them via [`Self::register_sites`].
    pub async fn new() -> Self {
        let upstream_addr = spawn_fake_upstream().await;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            SqliteStore::new(&temp_dir.path().join("test.db")).expect("Failed to create store"),
        );

        let registry = Arc::new(SourceRegistry::new("http://unused.test"));
        registry.install(HashMap::new());

        let cache = Arc::new(SearchCache::new());
        let client = Arc::new(UpstreamClient::new(cache));
        let search = Arc::new(SearchService::new(Arc::clone(&registry), client));

        let credentials = Credentials {
            username: TEST_USERNAME.to_string(),
            password: TEST_PASSWORD.to_string(),
            subscription_url: "http://unused.test".to_string(),
        };

        let state = Arc::new(AppState::new(
            search,
            Arc::clone(&registry),
            Arc::clone(&store) as Arc<dyn VideoStore>,
            credentials,
        ));

        Self {
            router: create_router(state),
            store,
            registry,
            upstream_addr,
            temp_dir,
        }
    }

    /// Register sites whose `api` points at the given fake-upstream paths.
    pub fn register_sites(&self, sites: &[(&str, &str)]) {
        let map = sites
            .iter()
            .map(|(key, path)| {
                (
                    key.to_string(),
                    ApiSite {
                        key: key.to_string(),
                        name: format!("Site {}", key),
                        api: format!("http://{}{}", self.upstream_addr, path),
                        detail: String::new(),
                    },
                )
            })
            .collect();
        self.registry.install(map);
    }

    /// Cookie value the auth middleware accepts.
    pub fn auth_cookie() -> String {
        let json = json!({
            "role": "owner",
            "username": TEST_USERNAME,
            "password": TEST_PASSWORD,
        })
        .to_string();
        format!(
            "auth={}",
            urlencoding::encode(&urlencoding::encode(&json))
        )
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, true).await
    }

    pub async fn get_unauthenticated(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, false).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), true).await
    }

    pub async fn post_unauthenticated(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), false).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None, true).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        authenticated: bool,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if authenticated {
            builder = builder.header(header::COOKIE, Self::auth_cookie());
        }

        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let raw_body = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            raw_body,
            headers,
        }
    }
}

impl TestResponse {
    /// Parse an SSE body into its JSON event payloads, in order.
    pub fn sse_events(&self) -> Vec<Value> {
        self.raw_body
            .split("\n\n")
            .filter_map(|chunk| chunk.trim().strip_prefix("data: "))
            .map(|data| serde_json::from_str(data).expect("Invalid SSE event payload"))
            .collect()
    }
}

/// Start the fake upstream catalog on an ephemeral port.
async fn spawn_fake_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/good", get(good_site))
        .route("/second", get(second_site))
        .route("/adult", get(adult_site))
        .route("/stringid", get(string_id_site))
        .route("/forbidden", get(forbidden_site))
        .route("/broken", get(broken_site))
        .route("/empty", get(empty_site))
        .route("/contentonly", get(content_only_site))
        .route("/paged", get(paged_site));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake upstream");
    let addr = listener.local_addr().expect("No local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake upstream died");
    });

    addr
}

fn search_item(id: i64, name: &str, episodes: usize, type_name: &str) -> Value {
    let play_url = (1..=episodes)
        .map(|n| format!("第{n}集$http://media.test/{id}/{n}.m3u8"))
        .collect::<Vec<_>>()
        .join("#");
    json!({
        "vod_id": id,
        "vod_name": name,
        "vod_pic": format!("http://media.test/{id}.jpg"),
        "vod_play_url": play_url,
        "vod_year": "2021",
        "vod_content": "<p>a tale</p>",
        "type_name": type_name,
    })
}

/// Two regular results; also serves the detail endpoint for this site.
async fn good_site(Query(params): Query<HashMap<String, String>>) -> Response {
    if let Some(ids) = params.get("ids") {
        let id: i64 = ids.parse().unwrap_or(0);
        return axum::Json(json!({
            "list": [search_item(id, "Good Detail", 4, "剧情片")],
        }))
        .into_response();
    }

    axum::Json(json!({
        "list": [
            search_item(1, "Good One", 2, "剧情片"),
            search_item(2, "Good Two", 3, "动作片"),
        ],
        "pagecount": 1,
    }))
    .into_response()
}

/// One result, so multi-site merges are observable.
async fn second_site() -> Response {
    axum::Json(json!({
        "list": [search_item(9, "Second Hit", 1, "动作片")],
        "pagecount": 1,
    }))
    .into_response()
}

/// One blocked-category result next to a regular one.
async fn adult_site() -> Response {
    axum::Json(json!({
        "list": [
            search_item(7, "Filtered Out", 2, "伦理片"),
            search_item(8, "Kept", 2, "动作片"),
        ],
        "pagecount": 1,
    }))
    .into_response()
}

/// Serves the string-id wire shape.
async fn string_id_site() -> Response {
    axum::Json(json!({
        "list": [{
            "vod_id": "77",
            "vod_name": "Stringly Typed",
            "vod_pic": "http://media.test/77.jpg",
            "vod_play_url": "第1集$http://media.test/77/1.m3u8",
            "vod_year": "2019",
        }],
        "pagecount": 1,
    }))
    .into_response()
}

async fn forbidden_site() -> Response {
    StatusCode::FORBIDDEN.into_response()
}

/// Returns a body neither wire shape can decode.
async fn broken_site() -> Response {
    "certainly not json".into_response()
}

/// A well-formed response with nothing in it.
async fn empty_site() -> Response {
    axum::Json(json!({"list": [], "pagecount": 0})).into_response()
}

/// Requests seen by [`paged_site`], across all its pages.
pub static PAGED_REQUESTS: AtomicUsize = AtomicUsize::new(0);

/// Multi-page site: pages 1 and 2 carry one result each, later pages
/// fail. Claims far more pages than exist so the page cap is observable
/// through [`PAGED_REQUESTS`].
async fn paged_site(Query(params): Query<HashMap<String, String>>) -> Response {
    PAGED_REQUESTS.fetch_add(1, Ordering::SeqCst);
    match params.get("pg").map(String::as_str) {
        None | Some("1") => axum::Json(json!({
            "list": [search_item(21, "Paged One", 1, "剧情片")],
            "pagecount": 99,
        }))
        .into_response(),
        Some("2") => axum::Json(json!({
            "list": [search_item(22, "Paged Two", 1, "剧情片")],
            "pagecount": 99,
        }))
        .into_response(),
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Detail endpoint whose only playable link hides in the description.
async fn content_only_site() -> Response {
    axum::Json(json!({
        "list": [{
            "vod_id": 3,
            "vod_name": "Buried Link",
            "vod_pic": "http://media.test/3.jpg",
            "vod_play_url": "",
            "vod_content": "<p>watch at $https://x/y.m3u8 tonight</p>",
        }],
    }))
    .into_response()
}

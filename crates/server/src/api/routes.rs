use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{
    detail, favorites, login, middleware::auth_middleware, play_records, search, search_history,
};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Everything except login sits behind the auth cookie.
    let protected = Router::new()
        .route("/search", get(search::search))
        .route("/search/ws", get(search::search_stream))
        .route("/detail", get(detail::detail))
        .route(
            "/favorites",
            get(favorites::get_favorites)
                .post(favorites::post_favorite)
                .delete(favorites::delete_favorite),
        )
        .route(
            "/playrecords",
            get(play_records::get_play_records)
                .post(play_records::post_play_record)
                .delete(play_records::delete_play_records),
        )
        .route(
            "/searchhistory",
            get(search_history::get_history)
                .post(search_history::post_keyword)
                .delete(search_history::delete_keyword),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/login", post(login::login))
        .merge(protected)
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
}

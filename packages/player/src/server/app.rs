//! Application setup and router.

use axum::extract::DefaultBodyLimit;
use axum::http::{header::CONTENT_TYPE, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::player::PlayerHandle;
use crate::kernel::render_feed::RenderFeed;
use crate::server::routes::{events_hint, get_state, health_handler, post_event, render_stream};

/// Request bodies above this are rejected before JSON parsing.
pub const MAX_BODY_BYTES: usize = 1_000_000;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub player: PlayerHandle,
    pub feed: RenderFeed,
}

/// Build the ingress router.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/events", get(events_hint).post(post_event))
        .route("/state", get(get_state))
        .route("/render-stream", get(render_stream))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::domains::player_state::PlayerState;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    state: PlayerState,
    viewers: usize,
}

/// Health check endpoint
///
/// Round-trips through the player task, so a dead runtime shows up as 503.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    let current = state.player.state().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        state: current,
        viewers: state.feed.subscriber_count(),
    }))
}

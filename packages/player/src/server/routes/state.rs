use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::domains::player_state::PlayerState;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Serialize)]
pub struct StateResponse {
    state: PlayerState,
}

/// GET /state
pub async fn get_state(State(state): State<AppState>) -> Result<Json<StateResponse>, ApiError> {
    let current = state.player.state().await?;
    Ok(Json(StateResponse { state: current }))
}

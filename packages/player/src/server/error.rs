//! HTTP error mapping for the event ingress.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domains::events::ValidationError;
use crate::domains::player_state::IllegalTransition;
use crate::kernel::player::PlayerError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(IllegalTransition),

    #[error("Player runtime is not running")]
    Unavailable,
}

impl From<PlayerError> for ApiError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::Unavailable => ApiError::Unavailable,
            PlayerError::Conflict(illegal) => ApiError::Conflict(illegal),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(err) => json!({ "error": err.to_string(), "field": err.field() }),
            ApiError::Conflict(err) => json!({ "error": err.to_string(), "state": err.state }),
            ApiError::InvalidJson(_) | ApiError::Unavailable => json!({ "error": self.to_string() }),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

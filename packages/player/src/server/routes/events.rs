//! POST /events: the only way events enter the player.
//!
//! The body is taken as raw bytes so malformed JSON gets our error shape
//! rather than the extractor's. An empty body is treated as `{}` and then
//! fails validation like any other incomplete event.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::domains::events::validate;
use crate::kernel::player::IngestOutcome;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Serialize)]
pub struct EventAccepted {
    ok: bool,
    #[serde(flatten)]
    outcome: IngestOutcome,
}

pub async fn post_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EventAccepted>, ApiError> {
    let raw: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidJson(e.to_string()))?
    };

    let event = validate(&raw)?;
    let outcome = state.player.ingest(event).await?;

    Ok(Json(EventAccepted { ok: true, outcome }))
}

/// GET /events: usage hint for humans poking at the endpoint.
pub async fn events_hint() -> Json<Value> {
    Json(json!({
        "ok": true,
        "hint": "POST JSON events to /events",
        "example": {
            "type": "NFC_TAP",
            "timestamp": "2026-02-01T10:00:00Z",
            "studentId": "S-001"
        },
        "types": ["IDLE", "VISION_PRESENT", "NFC_TAP"]
    }))
}

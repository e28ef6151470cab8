use std::sync::Arc;

use player_core::domains::campaigns::{Campaign, ContentKind, RenderItem};
use serde_json::{json, Value};

pub fn text_item(content_id: &str, order: i64, duration_sec: f64) -> RenderItem {
    RenderItem {
        content_id: content_id.to_string(),
        kind: ContentKind::Text,
        data: format!("{content_id} text"),
        duration_sec,
        order,
    }
}

pub fn welcome_campaign() -> Arc<Campaign> {
    Arc::new(Campaign::new(
        "welcome",
        "Welcome",
        1,
        "2026-02-01T10:00:00Z",
        vec![text_item("hello", 1, 2.0), text_item("bye", 2, 3.0)],
    ))
}

pub fn vision_present() -> Value {
    json!({ "type": "VISION_PRESENT", "timestamp": "2026-02-01T10:00:00Z" })
}

pub fn nfc_tap(student_id: &str) -> Value {
    json!({ "type": "NFC_TAP", "timestamp": "2026-02-01T10:00:05Z", "studentId": student_id })
}

pub fn idle() -> Value {
    json!({ "type": "IDLE", "timestamp": "2026-02-01T10:00:10Z" })
}

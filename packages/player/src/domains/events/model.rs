use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// The closed set of event types a player understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Explicit return to the idle loop.
    Idle,
    /// Someone is standing in front of the screen.
    VisionPresent,
    /// A badge was tapped on the NFC reader.
    NfcTap,
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::Idle, EventType::VisionPresent, EventType::NfcTap];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Idle => "IDLE",
            EventType::VisionPresent => "VISION_PRESENT",
            EventType::NfcTap => "NFC_TAP",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownType {
                value: s.to_string(),
            })
    }
}

/// A validated event.
///
/// `student_id` is `Some` exactly when `event_type` is [`EventType::NfcTap`];
/// [`validate`](super::validate) is the only constructor that enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names_roundtrip() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
    }

    #[test]
    fn test_event_type_rejects_lowercase() {
        let err = "nfc_tap".parse::<EventType>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownType {
                value: "nfc_tap".to_string()
            }
        );
    }

    #[test]
    fn test_event_serializes_with_wire_names() {
        let event = Event {
            event_type: EventType::NfcTap,
            timestamp: "2026-02-01T10:00:00Z".parse().unwrap(),
            student_id: Some("s-42".to_string()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NFC_TAP");
        assert_eq!(json["studentId"], "s-42");
    }
}

//! Boundary validation: raw JSON in, typed [`Event`] out.
//!
//! Rules are checked in a fixed order and the first failure is reported:
//! object shape, `type`, `timestamp`, then the `studentId` rule.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use super::model::{Event, EventType};

/// Why a raw payload was rejected. Recoverable: nothing was mutated and the
/// caller may retry with a corrected payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Event must be a JSON object (got {found})")]
    NotAnObject { found: &'static str },

    #[error("Event.type must be a string")]
    TypeNotString,

    #[error("Unknown event type: {value}")]
    UnknownType { value: String },

    #[error("Event.timestamp must be an ISO date-time string")]
    InvalidTimestamp { value: Option<String> },

    #[error("NFC_TAP requires non-empty studentId")]
    MissingStudentId,

    #[error("{event_type} must not include studentId")]
    UnexpectedStudentId { event_type: EventType },
}

impl ValidationError {
    /// The payload field the error is about.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NotAnObject { .. } => "$",
            ValidationError::TypeNotString | ValidationError::UnknownType { .. } => "type",
            ValidationError::InvalidTimestamp { .. } => "timestamp",
            ValidationError::MissingStudentId | ValidationError::UnexpectedStudentId { .. } => {
                "studentId"
            }
        }
    }
}

/// Validate a raw payload into an [`Event`]. Pure.
///
/// Fields other than `type`, `timestamp` and `studentId` are ignored.
pub fn validate(raw: &Value) -> Result<Event, ValidationError> {
    let obj = as_object(raw)?;

    let event_type = match obj.get("type") {
        Some(Value::String(s)) => s.parse::<EventType>()?,
        _ => return Err(ValidationError::TypeNotString),
    };

    let timestamp = match obj.get("timestamp") {
        Some(Value::String(s)) => {
            parse_timestamp(s).ok_or_else(|| ValidationError::InvalidTimestamp {
                value: Some(s.clone()),
            })?
        }
        _ => return Err(ValidationError::InvalidTimestamp { value: None }),
    };

    let student_id = match event_type {
        EventType::NfcTap => match obj.get("studentId") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => return Err(ValidationError::MissingStudentId),
        },
        other => {
            // Presence of the key is enough, even with a null value.
            if obj.contains_key("studentId") {
                return Err(ValidationError::UnexpectedStudentId { event_type: other });
            }
            None
        }
    };

    Ok(Event {
        event_type,
        timestamp,
        student_id,
    })
}

fn as_object(raw: &Value) -> Result<&Map<String, Value>, ValidationError> {
    let found = match raw {
        Value::Object(obj) => return Ok(obj),
        Value::Array(_) => "array",
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
    };
    Err(ValidationError::NotAnObject { found })
}

/// Accepts RFC 3339, a naive ISO date-time (read as UTC), or a bare ISO date.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

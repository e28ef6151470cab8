//! Incoming presence/interaction events and their boundary validation.
//!
//! Hardware integrations (vision, NFC readers) post events as raw JSON.
//! The model is closed: three event types, a timestamp, and a student id
//! that only an NFC tap may carry.

pub mod model;
pub mod validation;

pub use model::{Event, EventType};
pub use validation::{validate, ValidationError};

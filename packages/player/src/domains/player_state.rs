//! Strict finite-state machine for the player mode.
//!
//! The machine is a pure function over an explicit state. Whoever owns the
//! [`PlayerState`] passes it in and stores what comes back; nothing here
//! holds state between calls.
//!
//! ```text
//!            VISION_PRESENT            NFC_TAP
//!   Idle ───────────────► Interactive ─────────► PlayingCampaign
//!    │ ▲                                               ▲
//!    │ └──────────── IDLE (from any state) ────────────┤
//!    └──────────────────────── NFC_TAP ────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domains::events::EventType;

/// Player mode. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerState {
    /// Default informational loop.
    #[default]
    Idle,
    /// Presence detected, waiting for an interaction.
    Interactive,
    /// A campaign is on screen.
    PlayingCampaign,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Idle => "Idle",
            PlayerState::Interactive => "Interactive",
            PlayerState::PlayingCampaign => "PlayingCampaign",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown player state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for PlayerState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Idle" => Ok(PlayerState::Idle),
            "Interactive" => Ok(PlayerState::Interactive),
            "PlayingCampaign" => Ok(PlayerState::PlayingCampaign),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

/// Result of applying one event to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub next_state: PlayerState,
    pub changed: bool,
}

/// A (state, event) pair with no row in the transition table.
///
/// Unreachable while the event set stays closed; surfaced as a conflict and
/// the caller's state is left as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Illegal transition: state={state} event={event}")]
pub struct IllegalTransition {
    pub state: PlayerState,
    pub event: EventType,
}

/// (from, event) -> to. `changed` is derived as `from != to`.
const TRANSITIONS: [(PlayerState, EventType, PlayerState); 9] = [
    (PlayerState::Idle, EventType::Idle, PlayerState::Idle),
    (PlayerState::Idle, EventType::VisionPresent, PlayerState::Interactive),
    (PlayerState::Idle, EventType::NfcTap, PlayerState::PlayingCampaign),
    (PlayerState::Interactive, EventType::Idle, PlayerState::Idle),
    (PlayerState::Interactive, EventType::VisionPresent, PlayerState::Interactive),
    (PlayerState::Interactive, EventType::NfcTap, PlayerState::PlayingCampaign),
    (PlayerState::PlayingCampaign, EventType::Idle, PlayerState::Idle),
    (PlayerState::PlayingCampaign, EventType::VisionPresent, PlayerState::PlayingCampaign),
    (PlayerState::PlayingCampaign, EventType::NfcTap, PlayerState::PlayingCampaign),
];

/// Apply `event` to `state`.
pub fn transition(state: PlayerState, event: EventType) -> Result<Transition, IllegalTransition> {
    TRANSITIONS
        .iter()
        .find(|(from, on, _)| *from == state && *on == event)
        .map(|&(from, _, to)| Transition {
            next_state: to,
            changed: from != to,
        })
        .ok_or(IllegalTransition { state, event })
}

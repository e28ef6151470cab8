// IDS Player - Core
//
// Reacts to presence and interaction events and decides what the screen shows.
// A strict state machine tracks the player mode while the playback scheduler
// sequences campaign items on cancellable timers.
//
// Domains hold the pure logic; the kernel holds timers, renderers and the
// single-task runtime that serialises events and timer fires.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;

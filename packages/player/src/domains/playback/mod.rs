//! Playback scheduling: which campaign is on screen, which item, and when
//! the next one comes up.

pub mod observer;
pub mod scheduler;

pub use observer::{ClearNotice, NoopObserver, PlaybackObserver, RenderNotice};
pub use scheduler::{
    Scheduler, SchedulerBuilder, StartReason, TimerOutcome, DEFAULT_INACTIVITY,
};

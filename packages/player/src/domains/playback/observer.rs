//! Synchronous notifications emitted by the scheduler.
//!
//! Hooks run inline, inside the scheduler call that caused them and in the
//! order the effects happened. Implementations must not block.

use crate::domains::campaigns::RenderItem;

/// An item was just handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct RenderNotice<'a> {
    pub item: &'a RenderItem,
    pub campaign_id: &'a str,
    pub campaign_name: &'a str,
}

/// Playback was stopped and the screen cleared.
#[derive(Debug, Clone, Copy)]
pub struct ClearNotice<'a> {
    pub reason: &'a str,
}

pub trait PlaybackObserver: Send {
    fn on_render(&mut self, _notice: &RenderNotice<'_>) {}

    fn on_clear(&mut self, _notice: &ClearNotice<'_>) {}

    /// The inactivity timer expired. Playback has already been stopped.
    fn on_idle_timeout(&mut self) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PlaybackObserver for NoopObserver {}

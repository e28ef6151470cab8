//! Campaign scheduler.
//!
//! Owns the playback runtime state (current campaign, item index, timers)
//! and applies the preemption and restart rules:
//!
//! - `IDLE` stops playback and disarms the inactivity timer.
//! - Any other event re-arms the inactivity timer, then:
//!   - nothing playing: start the selected campaign
//!   - selected has higher priority: preempt
//!   - `NFC_TAP`: restart the selected campaign from item 0
//!   - otherwise: keep playing
//!
//! Each render arms exactly one item-advance timer; the fire advances the
//! index and renders again, looping over the playlist until something stops
//! it. Fires are delivered back through [`Scheduler::handle_timer`] and are
//! dropped if the timer was cancelled or re-armed in the meantime.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::domains::campaigns::{select_campaign, Campaign};
use crate::domains::events::EventType;
use crate::kernel::renderer::Renderer;
use crate::kernel::timers::{TimerFired, TimerFiredRx, TimerKind, TimerManager};

use super::observer::{ClearNotice, NoopObserver, PlaybackObserver, RenderNotice};

/// Silence period after which playback is forced back to idle.
pub const DEFAULT_INACTIVITY: Duration = Duration::from_secs(30);

/// Why a campaign was (re)started. Also used as the clear reason for the
/// stop that precedes the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartReason {
    Start { on: EventType },
    Preempt { from: i64, to: i64 },
    Restart,
}

impl fmt::Display for StartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartReason::Start { on } => write!(f, "start on {on}"),
            StartReason::Preempt { from, to } => write!(f, "preempt (priority {from} -> {to})"),
            StartReason::Restart => write!(f, "restart on {}", EventType::NfcTap),
        }
    }
}

/// What a timer fire turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The playlist moved to the next item.
    Advanced,
    /// Inactivity expired; playback stopped and observers were told.
    IdleTimeout,
    /// The timer had been cancelled or re-armed; nothing happened.
    Stale,
}

struct Playback {
    campaign: Arc<Campaign>,
    index: usize,
}

pub struct SchedulerBuilder {
    campaigns: Vec<Arc<Campaign>>,
    renderer: Box<dyn Renderer>,
    observer: Box<dyn PlaybackObserver>,
    inactivity: Duration,
}

impl SchedulerBuilder {
    pub fn new(campaigns: Vec<Arc<Campaign>>, renderer: impl Renderer + 'static) -> Self {
        Self {
            campaigns,
            renderer: Box::new(renderer),
            observer: Box::new(NoopObserver),
            inactivity: DEFAULT_INACTIVITY,
        }
    }

    pub fn with_observer(mut self, observer: impl PlaybackObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn with_inactivity(mut self, inactivity: Duration) -> Self {
        self.inactivity = inactivity;
        self
    }

    /// Build the scheduler. The returned receiver carries its timer fires and
    /// must be drained into [`Scheduler::handle_timer`] on the same logical
    /// sequence as [`Scheduler::handle_event`].
    pub fn build(self) -> (Scheduler, TimerFiredRx) {
        let (timers, timer_rx) = TimerManager::new();
        let scheduler = Scheduler {
            campaigns: self.campaigns,
            renderer: self.renderer,
            observer: self.observer,
            inactivity: self.inactivity,
            playback: None,
            timers,
        };
        (scheduler, timer_rx)
    }
}

pub struct Scheduler {
    campaigns: Vec<Arc<Campaign>>,
    renderer: Box<dyn Renderer>,
    observer: Box<dyn PlaybackObserver>,
    inactivity: Duration,
    playback: Option<Playback>,
    timers: TimerManager,
}

impl Scheduler {
    pub fn builder(
        campaigns: Vec<Arc<Campaign>>,
        renderer: impl Renderer + 'static,
    ) -> SchedulerBuilder {
        SchedulerBuilder::new(campaigns, renderer)
    }

    /// React to a validated event.
    pub fn handle_event(&mut self, event: EventType) {
        if event == EventType::Idle {
            self.timers.cancel_timer(TimerKind::Inactivity);
            self.stop_playback("event IDLE");
            return;
        }

        self.timers.set_timer(TimerKind::Inactivity, self.inactivity);

        let Some(selected) = select_campaign(&self.campaigns).cloned() else {
            debug!(%event, "no campaign to select");
            return;
        };

        let reason = match &self.playback {
            None => StartReason::Start { on: event },
            Some(current) if selected.priority() > current.campaign.priority() => {
                StartReason::Preempt {
                    from: current.campaign.priority(),
                    to: selected.priority(),
                }
            }
            Some(current) if event == EventType::NfcTap => {
                if current.campaign.id() == selected.id() {
                    StartReason::Restart
                } else {
                    StartReason::Start { on: event }
                }
            }
            Some(_) => return,
        };

        self.start_campaign(selected, reason);
    }

    /// Apply a timer fire from the channel returned by the builder.
    pub fn handle_timer(&mut self, fired: TimerFired) -> TimerOutcome {
        if !self.timers.claim(fired) {
            return TimerOutcome::Stale;
        }

        match fired.kind {
            TimerKind::ItemAdvance => {
                let Some(playback) = self.playback.as_mut() else {
                    return TimerOutcome::Stale;
                };
                playback.index += 1;
                self.render_current();
                TimerOutcome::Advanced
            }
            TimerKind::Inactivity => {
                info!(
                    inactivity_ms = self.inactivity.as_millis() as u64,
                    "inactivity timeout -> IDLE"
                );
                self.stop_playback("inactivity-timeout");
                self.observer.on_idle_timeout();
                TimerOutcome::IdleTimeout
            }
        }
    }

    /// Stop whatever is playing and play `campaign` from its first item.
    pub fn start_campaign(&mut self, campaign: Arc<Campaign>, reason: StartReason) {
        let reason_text = reason.to_string();
        self.stop_playback(&reason_text);

        info!(
            campaign_id = campaign.id(),
            priority = campaign.priority(),
            reason = %reason_text,
            "start campaign"
        );
        self.playback = Some(Playback { campaign, index: 0 });
        self.render_current();
    }

    /// Stop playback and clear the screen. Idempotent: calling it again just
    /// clears and notifies again.
    pub fn stop_playback(&mut self, reason: &str) {
        self.timers.cancel_timer(TimerKind::ItemAdvance);

        if let Some(playback) = self.playback.take() {
            info!(campaign_id = playback.campaign.id(), reason, "stop campaign");
        }

        guarded("clear", || self.renderer.clear());
        self.observer.on_clear(&ClearNotice { reason });
    }

    fn render_current(&mut self) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };
        let count = playback.campaign.items().len();
        if count == 0 {
            return;
        }

        playback.index %= count;
        let index = playback.index;
        let campaign = Arc::clone(&playback.campaign);
        let item = &campaign.items()[index];

        guarded("render", || self.renderer.render(item));
        self.observer.on_render(&RenderNotice {
            item,
            campaign_id: campaign.id(),
            campaign_name: campaign.name(),
        });

        let duration = item.display_duration();
        self.timers.set_timer(TimerKind::ItemAdvance, duration);
        debug!(
            campaign_id = campaign.id(),
            index,
            kind = %item.kind,
            content_id = %item.content_id,
            ?duration,
            "item on screen"
        );
    }

    pub fn campaigns(&self) -> &[Arc<Campaign>] {
        &self.campaigns
    }

    pub fn current_campaign(&self) -> Option<&Arc<Campaign>> {
        self.playback.as_ref().map(|p| &p.campaign)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.playback.as_ref().map(|p| p.index)
    }

    pub fn is_item_timer_armed(&self) -> bool {
        self.timers.is_armed(TimerKind::ItemAdvance)
    }

    pub fn is_inactivity_timer_armed(&self) -> bool {
        self.timers.is_armed(TimerKind::Inactivity)
    }

    pub fn inactivity(&self) -> Duration {
        self.inactivity
    }
}

/// Run a renderer call, containing any panic so playback state stays
/// consistent.
fn guarded(op: &'static str, f: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
        error!(op, panic = %panic_message(panic.as_ref()), "renderer panicked");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Cancellable deferred tasks for the playback scheduler.
//!
//! Each timer is a tokio task that sleeps until an absolute deadline and then
//! sends a [`TimerFired`] message back to the owner's event loop. The owner
//! applies the fire only if [`TimerManager::claim`] accepts it.
//!
//! Aborting the task is not enough on its own: the fire may already be
//! sitting in the channel when a cancel happens. Every arm therefore gets a
//! fresh generation, and a fire whose generation is no longer the live one is
//! stale and must be dropped.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// The two timers a scheduler may have outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Advances the playlist to the next item.
    ItemAdvance,
    /// Forces idle after a period with no activity.
    Inactivity,
}

/// Message sent by a timer task when its deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Receiving side of the timer channel; drained by the scheduler's owner.
pub type TimerFiredRx = mpsc::UnboundedReceiver<TimerFired>;

/// Cap for deadlines that would overflow `Instant` (about 30 years out).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

struct ArmedTimer {
    generation: u64,
    deadline: Instant,
    handle: JoinHandle<()>,
}

/// Owns the timer tasks of one scheduler.
pub struct TimerManager {
    timers: HashMap<TimerKind, ArmedTimer>,
    next_generation: u64,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
}

impl TimerManager {
    /// Create a manager and the channel its timers fire into.
    pub fn new() -> (Self, TimerFiredRx) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let manager = Self {
            timers: HashMap::new(),
            next_generation: 0,
            fired_tx,
        };
        (manager, fired_rx)
    }

    /// Arm `kind` to fire after `duration`, cancelling any timer of the same
    /// kind first. Returns the generation of the new timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_timer(&mut self, kind: TimerKind, duration: Duration) -> u64 {
        self.cancel_timer(kind);

        self.next_generation += 1;
        let generation = self.next_generation;
        let deadline = deadline_after(duration);
        let fired_tx = self.fired_tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            trace!(?kind, generation, "timer fired");
            // Receiver gone means the owner shut down
            let _ = fired_tx.send(TimerFired { kind, generation });
        });

        self.timers.insert(
            kind,
            ArmedTimer {
                generation,
                deadline,
                handle,
            },
        );
        debug!(?kind, generation, ?duration, "timer armed");
        generation
    }

    /// Cancel a timer. Returns whether one was armed.
    pub fn cancel_timer(&mut self, kind: TimerKind) -> bool {
        match self.timers.remove(&kind) {
            Some(timer) => {
                timer.handle.abort();
                debug!(?kind, generation = timer.generation, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Accept a fire if it belongs to the live timer of its kind, disarming
    /// it. Stale fires (cancelled or superseded timers) return `false`.
    pub fn claim(&mut self, fired: TimerFired) -> bool {
        match self.timers.get(&fired.kind) {
            Some(timer) if timer.generation == fired.generation => {
                self.timers.remove(&fired.kind);
                true
            }
            _ => {
                trace!(kind = ?fired.kind, generation = fired.generation, "stale timer fire dropped");
                false
            }
        }
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.timers.contains_key(&kind)
    }

    /// Deadline of the live timer of `kind`, if armed.
    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.timers.get(&kind).map(|t| t.deadline)
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        for (kind, timer) in self.timers.drain() {
            timer.handle.abort();
            trace!(?kind, "timer cancelled (shutdown)");
        }
    }
}

/// `now + duration`, saturating to [`FAR_FUTURE`] instead of overflowing.
fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration.min(FAR_FUTURE))
        .unwrap_or(now)
}

impl Drop for TimerManager {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_at_deadline() {
        let (mut manager, mut rx) = TimerManager::new();
        let start = Instant::now();

        let generation = manager.set_timer(TimerKind::ItemAdvance, Duration::from_secs(2));
        let fired = rx.recv().await.unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "fired early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(2010), "fired late: {elapsed:?}");
        assert_eq!(
            fired,
            TimerFired {
                kind: TimerKind::ItemAdvance,
                generation
            }
        );
        assert!(manager.claim(fired));
        assert!(!manager.is_armed(TimerKind::ItemAdvance));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (mut manager, mut rx) = TimerManager::new();

        manager.set_timer(TimerKind::Inactivity, Duration::from_millis(50));
        assert!(manager.cancel_timer(TimerKind::Inactivity));
        assert!(!manager.cancel_timer(TimerKind::Inactivity));

        let result = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert!(result.is_err(), "Timer should have been cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_supersedes_previous_generation() {
        let (mut manager, mut rx) = TimerManager::new();

        let first = manager.set_timer(TimerKind::Inactivity, Duration::from_secs(10));
        let second = manager.set_timer(TimerKind::Inactivity, Duration::from_secs(1));
        assert!(second > first);
        assert_eq!(manager.active_count(), 1);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.generation, second);
        assert!(manager.claim(fired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_already_queued_is_stale_after_cancel() {
        let (mut manager, mut rx) = TimerManager::new();

        manager.set_timer(TimerKind::ItemAdvance, Duration::from_millis(10));
        // Let the fire land in the channel before cancelling
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.cancel_timer(TimerKind::ItemAdvance);

        let fired = rx.recv().await.unwrap();
        assert!(!manager.claim(fired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_is_stale_after_rearm() {
        let (mut manager, mut rx) = TimerManager::new();

        manager.set_timer(TimerKind::ItemAdvance, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(20)).await;
        manager.set_timer(TimerKind::ItemAdvance, Duration::from_secs(5));

        let stale = rx.recv().await.unwrap();
        assert!(!manager.claim(stale));
        assert!(manager.is_armed(TimerKind::ItemAdvance));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_duration_is_capped_not_panicking() {
        let (mut manager, mut rx) = TimerManager::new();
        let start = Instant::now();

        manager.set_timer(TimerKind::Inactivity, Duration::MAX);
        manager.set_timer(TimerKind::ItemAdvance, Duration::from_secs(u64::MAX));

        let deadline = manager.deadline(TimerKind::Inactivity).unwrap();
        assert_eq!(deadline - start, FAR_FUTURE);
        assert_eq!(manager.deadline(TimerKind::ItemAdvance), Some(deadline));

        let result = tokio::time::timeout(Duration::from_secs(3600), rx.recv()).await;
        assert!(result.is_err(), "capped timer fired early");
        assert_eq!(manager.active_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_and_drop() {
        let (mut manager, mut rx) = TimerManager::new();

        manager.set_timer(TimerKind::ItemAdvance, Duration::from_millis(50));
        manager.set_timer(TimerKind::Inactivity, Duration::from_millis(50));
        assert_eq!(manager.active_count(), 2);

        manager.cancel_all();
        assert_eq!(manager.active_count(), 0);
        drop(manager);

        // All senders are gone once the aborted tasks are dropped
        let result = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert!(matches!(result, Ok(None)));
    }
}

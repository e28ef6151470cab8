//! Player runtime: the single task that owns all mutable playback state.
//!
//! Ingress hands validated events to a [`PlayerHandle`]; the task applies
//! them to the [`PlayerState`] and the [`Scheduler`] in arrival order,
//! interleaved with the scheduler's own timer fires. Nothing here is behind
//! a lock because nothing here is shared.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domains::events::{Event, EventType};
use crate::domains::playback::{Scheduler, TimerOutcome};
use crate::domains::player_state::{transition, IllegalTransition, PlayerState};
use crate::kernel::timers::{TimerFired, TimerFiredRx};

const COMMAND_BUFFER: usize = 64;

/// Result of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub prev_state: PlayerState,
    pub next_state: PlayerState,
    pub changed: bool,
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player runtime is not running")]
    Unavailable,

    #[error(transparent)]
    Conflict(#[from] IllegalTransition),
}

enum PlayerCommand {
    Ingest {
        event: Event,
        reply: oneshot::Sender<Result<IngestOutcome, IllegalTransition>>,
    },
    State {
        reply: oneshot::Sender<PlayerState>,
    },
}

/// Cloneable front door to the player task.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
}

impl PlayerHandle {
    /// Apply a validated event and return the state change it caused.
    pub async fn ingest(&self, event: Event) -> Result<IngestOutcome, PlayerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(PlayerCommand::Ingest { event, reply })
            .await
            .map_err(|_| PlayerError::Unavailable)?;
        let outcome = rx.await.map_err(|_| PlayerError::Unavailable)?;
        Ok(outcome?)
    }

    pub async fn state(&self) -> Result<PlayerState, PlayerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(PlayerCommand::State { reply })
            .await
            .map_err(|_| PlayerError::Unavailable)?;
        rx.await.map_err(|_| PlayerError::Unavailable)
    }
}

pub struct Player {
    state: PlayerState,
    scheduler: Scheduler,
    timer_rx: TimerFiredRx,
    commands: mpsc::Receiver<PlayerCommand>,
}

impl Player {
    /// Start the player task. It runs until every handle is dropped; the
    /// scheduler (and with it every pending timer) goes away with it.
    pub fn spawn(scheduler: Scheduler, timer_rx: TimerFiredRx) -> (PlayerHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let player = Player {
            state: PlayerState::default(),
            scheduler,
            timer_rx,
            commands,
        };
        let task = tokio::spawn(player.run());
        (PlayerHandle { commands: tx }, task)
    }

    async fn run(mut self) {
        info!(
            campaigns = self.scheduler.campaigns().len(),
            inactivity_secs = self.scheduler.inactivity().as_secs_f64(),
            "player started"
        );

        loop {
            tokio::select! {
                biased;

                Some(fired) = self.timer_rx.recv() => self.on_timer(fired),

                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Ingest { event, reply }) => {
                        let _ = reply.send(self.ingest(&event));
                    }
                    Some(PlayerCommand::State { reply }) => {
                        let _ = reply.send(self.state);
                    }
                    None => break,
                },
            }
        }

        info!("player stopped");
    }

    fn ingest(&mut self, event: &Event) -> Result<IngestOutcome, IllegalTransition> {
        let prev_state = self.state;
        let step = transition(prev_state, event.event_type).map_err(|err| {
            warn!(error = %err, "rejected event");
            err
        })?;

        self.state = step.next_state;
        info!(
            event = %event.event_type,
            student_id = event.student_id.as_deref(),
            from = %prev_state,
            to = %step.next_state,
            changed = step.changed,
            "event applied"
        );

        self.scheduler.handle_event(event.event_type);

        Ok(IngestOutcome {
            prev_state,
            next_state: step.next_state,
            changed: step.changed,
        })
    }

    fn on_timer(&mut self, fired: TimerFired) {
        match self.scheduler.handle_timer(fired) {
            TimerOutcome::IdleTimeout => match transition(self.state, EventType::Idle) {
                Ok(step) => {
                    info!(from = %self.state, to = %step.next_state, "state reset on inactivity");
                    self.state = step.next_state;
                }
                Err(err) => warn!(error = %err, "could not reset state on inactivity"),
            },
            TimerOutcome::Stale => debug!(kind = ?fired.kind, "dropped stale timer fire"),
            TimerOutcome::Advanced => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use crate::domains::campaigns::{Campaign, ContentKind, RenderItem};
    use crate::kernel::render_feed::{FeedMessage, RenderFeed};
    use crate::kernel::renderer::LogRenderer;

    fn event(event_type: EventType) -> Event {
        Event {
            event_type,
            timestamp: Utc::now(),
            student_id: (event_type == EventType::NfcTap).then(|| "S-001".to_string()),
        }
    }

    fn start(inactivity: Duration) -> (PlayerHandle, RenderFeed) {
        let campaign = Campaign::new(
            "welcome",
            "Welcome",
            1,
            "2026-02-01T10:00:00Z",
            vec![RenderItem {
                content_id: "hello".to_string(),
                kind: ContentKind::Text,
                data: "Hello".to_string(),
                duration_sec: 2.0,
                order: 1,
            }],
        );
        let feed = RenderFeed::new();
        let (scheduler, timer_rx) = Scheduler::builder(vec![Arc::new(campaign)], LogRenderer)
            .with_observer(feed.clone())
            .with_inactivity(inactivity)
            .build();
        let (handle, _task) = Player::spawn(scheduler, timer_rx);
        (handle, feed)
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_walk_the_state_machine() {
        let (player, _feed) = start(Duration::from_secs(30));
        assert_eq!(player.state().await.unwrap(), PlayerState::Idle);

        let steps = [
            (EventType::VisionPresent, PlayerState::Idle, PlayerState::Interactive, true),
            (EventType::NfcTap, PlayerState::Interactive, PlayerState::PlayingCampaign, true),
            (EventType::NfcTap, PlayerState::PlayingCampaign, PlayerState::PlayingCampaign, false),
            (EventType::Idle, PlayerState::PlayingCampaign, PlayerState::Idle, true),
            (EventType::Idle, PlayerState::Idle, PlayerState::Idle, false),
        ];

        for (event_type, prev, next, changed) in steps {
            let outcome = player.ingest(event(event_type)).await.unwrap();
            assert_eq!(
                outcome,
                IngestOutcome {
                    prev_state: prev,
                    next_state: next,
                    changed
                },
                "{event_type}"
            );
        }
        assert_eq!(player.state().await.unwrap(), PlayerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_starts_playback() {
        let (player, feed) = start(Duration::from_secs(30));
        let (_, mut rx) = feed.subscribe();

        player.ingest(event(EventType::VisionPresent)).await.unwrap();

        // stop-before-start clear, then the first item
        assert!(matches!(rx.recv().await.unwrap(), FeedMessage::Clear { .. }));
        match rx.recv().await.unwrap() {
            FeedMessage::Render { campaign_id, item, .. } => {
                assert_eq!(campaign_id, "welcome");
                assert_eq!(item.content_id, "hello");
            }
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactivity_returns_state_to_idle() {
        let (player, feed) = start(Duration::from_secs(10));
        let (_, mut rx) = feed.subscribe();

        player.ingest(event(EventType::VisionPresent)).await.unwrap();
        assert_eq!(player.state().await.unwrap(), PlayerState::Interactive);

        loop {
            if rx.recv().await.unwrap() == FeedMessage::IdleTimeout {
                break;
            }
        }
        assert_eq!(player.state().await.unwrap(), PlayerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_reports_unavailable_after_shutdown() {
        let (scheduler, timer_rx) = Scheduler::builder(vec![], LogRenderer).build();
        let (player, task) = Player::spawn(scheduler, timer_rx);

        task.abort();
        let _ = task.await;

        assert!(matches!(player.state().await, Err(PlayerError::Unavailable)));
        assert!(matches!(
            player.ingest(event(EventType::Idle)).await,
            Err(PlayerError::Unavailable)
        ));
    }
}

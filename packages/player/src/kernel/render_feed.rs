//! In-process fan-out of playback output for live viewers.
//!
//! Every render, clear and idle timeout is broadcast to subscribers (the SSE
//! endpoint). The item currently on screen is kept as a snapshot so a viewer
//! that connects mid-item sees it immediately instead of waiting for the
//! next advance.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::domains::campaigns::RenderItem;
use crate::domains::playback::{ClearNotice, PlaybackObserver, RenderNotice};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum FeedMessage {
    Render {
        item: RenderItem,
        campaign_id: String,
        campaign_name: String,
    },
    Clear {
        reason: String,
    },
    IdleTimeout,
}

impl FeedMessage {
    /// SSE event name for this message.
    pub fn event_name(&self) -> &'static str {
        match self {
            FeedMessage::Render { .. } => "render",
            FeedMessage::Clear { .. } => "clear",
            FeedMessage::IdleTimeout => "idle_timeout",
        }
    }
}

/// Cloneable handle; all clones share one channel and snapshot.
#[derive(Clone)]
pub struct RenderFeed {
    tx: broadcast::Sender<FeedMessage>,
    on_screen: Arc<Mutex<Option<FeedMessage>>>,
}

impl RenderFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            on_screen: Arc::new(Mutex::new(None)),
        }
    }

    /// Publish a message. No-op for the channel if nobody is listening; the
    /// snapshot is updated regardless.
    pub fn publish(&self, message: FeedMessage) {
        let mut on_screen = self.lock();
        match &message {
            FeedMessage::Render { .. } => *on_screen = Some(message.clone()),
            FeedMessage::Clear { .. } => *on_screen = None,
            FeedMessage::IdleTimeout => {}
        }
        // Ignore send errors (no active receivers)
        let _ = self.tx.send(message);
    }

    /// Subscribe, returning what is on screen right now plus a receiver for
    /// everything published afterwards. Nothing is lost or duplicated
    /// between the two.
    pub fn subscribe(&self) -> (Option<FeedMessage>, broadcast::Receiver<FeedMessage>) {
        let on_screen = self.lock();
        (on_screen.clone(), self.tx.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn lock(&self) -> MutexGuard<'_, Option<FeedMessage>> {
        // The snapshot is a plain value; a panic elsewhere can't leave it torn.
        self.on_screen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RenderFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackObserver for RenderFeed {
    fn on_render(&mut self, notice: &RenderNotice<'_>) {
        self.publish(FeedMessage::Render {
            item: notice.item.clone(),
            campaign_id: notice.campaign_id.to_string(),
            campaign_name: notice.campaign_name.to_string(),
        });
    }

    fn on_clear(&mut self, notice: &ClearNotice<'_>) {
        self.publish(FeedMessage::Clear {
            reason: notice.reason.to_string(),
        });
    }

    fn on_idle_timeout(&mut self) {
        self.publish(FeedMessage::IdleTimeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::campaigns::ContentKind;

    fn render(content_id: &str) -> FeedMessage {
        FeedMessage::Render {
            item: RenderItem {
                content_id: content_id.to_string(),
                kind: ContentKind::Text,
                data: "hello".to_string(),
                duration_sec: 2.0,
                order: 1,
            },
            campaign_id: "c1".to_string(),
            campaign_name: "Welcome".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_subscribe_roundtrip() {
        let feed = RenderFeed::new();
        let (snapshot, mut rx) = feed.subscribe();
        assert!(snapshot.is_none());

        feed.publish(render("a"));
        assert_eq!(rx.recv().await.unwrap(), render("a"));
    }

    #[tokio::test]
    async fn test_publish_no_subscribers_is_noop() {
        let feed = RenderFeed::new();
        feed.publish(render("a"));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_snapshot_follows_screen() {
        let feed = RenderFeed::new();

        feed.publish(render("a"));
        feed.publish(render("b"));
        assert_eq!(feed.subscribe().0, Some(render("b")));

        feed.publish(FeedMessage::IdleTimeout);
        assert_eq!(feed.subscribe().0, Some(render("b")));

        feed.publish(FeedMessage::Clear {
            reason: "event IDLE".to_string(),
        });
        assert_eq!(feed.subscribe().0, None);
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(render("a")).unwrap();
        assert_eq!(value["type"], "render");
        assert_eq!(value["campaignId"], "c1");
        assert_eq!(value["campaignName"], "Welcome");
        assert_eq!(value["item"]["contentId"], "a");
        assert_eq!(value["item"]["type"], "TEXT");
        assert_eq!(value["item"]["durationSec"], 2.0);

        let clear = serde_json::to_value(FeedMessage::Clear {
            reason: "inactivity-timeout".to_string(),
        })
        .unwrap();
        assert_eq!(clear, serde_json::json!({"type": "clear", "reason": "inactivity-timeout"}));

        let idle = serde_json::to_value(FeedMessage::IdleTimeout).unwrap();
        assert_eq!(idle, serde_json::json!({"type": "idle_timeout"}));
        assert_eq!(FeedMessage::IdleTimeout.event_name(), "idle_timeout");
    }

    #[tokio::test]
    async fn test_lagging_subscriber_is_told() {
        let feed = RenderFeed::with_capacity(2);
        let (_, mut rx) = feed.subscribe();

        for id in ["a", "b", "c", "d"] {
            feed.publish(render(id));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(rx.recv().await.unwrap(), render("c"));
    }
}

//! SSE render stream.
//!
//! GET /render-stream
//!
//! Emits `ready`, then the item currently on screen (if any), then every
//! `render`, `clear` and `idle_timeout` as it happens. A viewer that falls
//! behind gets a `lagged` event with the number of messages it missed.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::kernel::render_feed::FeedMessage;
use crate::server::app::AppState;

pub async fn render_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (on_screen, rx) = state.feed.subscribe();

    let ready = stream::once(async {
        Ok::<_, Infallible>(Event::default().event("ready").data(r#"{"ok":true}"#))
    });

    let replay = stream::iter(on_screen.as_ref().and_then(to_sse).map(Ok));

    let live = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(message) => to_sse(&message).map(Ok),
            Err(BroadcastStreamRecvError::Lagged(n)) => Event::default()
                .event("lagged")
                .json_data(serde_json::json!({ "missed": n }))
                .ok()
                .map(Ok),
        }
    });

    Sse::new(ready.chain(replay).chain(live)).keep_alive(KeepAlive::default())
}

fn to_sse(message: &FeedMessage) -> Option<Event> {
    Event::default()
        .event(message.event_name())
        .json_data(message)
        .ok()
}

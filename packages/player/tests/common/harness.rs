use std::time::Duration;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use player_core::domains::playback::Scheduler;
use player_core::kernel::{LogRenderer, Player, RenderFeed};
use player_core::server::{build_app, AppState};
use serde_json::Value;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use super::fixtures::welcome_campaign;

/// A router wired to a live player task.
pub struct TestApp {
    pub router: Router,
    pub player_task: JoinHandle<()>,
}

impl TestApp {
    pub fn new() -> Self {
        let feed = RenderFeed::new();
        let (scheduler, timer_rx) = Scheduler::builder(vec![welcome_campaign()], LogRenderer)
            .with_observer(feed.clone())
            .with_inactivity(Duration::from_secs(30))
            .build();
        let (player, player_task) = Player::spawn(scheduler, timer_rx);

        Self {
            router: build_app(AppState { player, feed }),
            player_task,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn post_raw(&self, body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/events")
            .header(CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_event(&self, event: &Value) -> (StatusCode, Value) {
        self.post_raw(event.to_string()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn state(&self) -> String {
        let (status, body) = self.get("/state").await;
        assert_eq!(status, StatusCode::OK);
        body["state"].as_str().unwrap().to_string()
    }
}

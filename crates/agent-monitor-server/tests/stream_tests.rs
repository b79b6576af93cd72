//! Integration tests for the SSE live stream.
//!
//! Streams are opened in-process with `tower::ServiceExt::oneshot`; the
//! response body is read frame by frame while events are ingested
//! through a clone of the same router.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::sync::Arc;
use std::time::Duration;

use agent_monitor_core::MonitorConfig;
use agent_monitor_server::router::build_router;
use agent_monitor_server::state::AppState;
use axum::Router;
use axum::body::{Body, BodyDataStream};
use axum::http::{Request, StatusCode};
use futures::StreamExt as _;
use serde_json::Value;
use tower::ServiceExt;

/// Reads `data:` frames out of an SSE body, skipping comments.
struct FrameReader {
    body: BodyDataStream,
    buf: String,
    /// Instance id announced by the stream's opening frame.
    instance: String,
}

impl FrameReader {
    /// Next data frame as `(event name, data)`.
    async fn next_frame(&mut self) -> (Option<String>, Value) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                while let Some(end) = self.buf.find("\n\n") {
                    let frame: String = self.buf.drain(..end + 2).collect();
                    let field = |name: &str| {
                        frame
                            .lines()
                            .find_map(|line| line.strip_prefix(name))
                            .map(|value| value.trim_start().to_owned())
                    };
                    if let Some(data) = field("data:") {
                        return (field("event:"), serde_json::from_str(&data).unwrap());
                    }
                }
                let chunk = self.body.next().await.unwrap().unwrap();
                self.buf.push_str(std::str::from_utf8(&chunk).unwrap());
            }
        })
        .await
        .unwrap()
    }

    /// Next unnamed (event) frame.
    async fn next_event(&mut self) -> Value {
        let (name, data) = self.next_frame().await;
        assert_eq!(name, None, "expected an event frame");
        data
    }

    /// Asserts that no data frame arrives within a short window.
    async fn assert_quiet(&mut self) {
        let waited =
            tokio::time::timeout(Duration::from_millis(200), self.body.next()).await;
        assert!(waited.is_err(), "unexpected frame on stream");
    }
}

fn make_state() -> Arc<AppState> {
    let mut config = MonitorConfig::default();
    config.stream.heartbeat_interval_ms = 60_000;
    Arc::new(AppState::new(&config))
}

async fn open_stream(router: &Router, request: Request<Body>) -> FrameReader {
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut reader = FrameReader {
        body: response.into_body().into_data_stream(),
        buf: String::new(),
        instance: String::new(),
    };
    let (name, data) = reader.next_frame().await;
    assert_eq!(name.as_deref(), Some("instance"));
    reader.instance = data["instance"].as_str().unwrap().to_owned();
    reader
}

async fn subscribe(router: &Router) -> FrameReader {
    open_stream(
        router,
        Request::get("/api/stream").body(Body::empty()).unwrap(),
    )
    .await
}

async fn ingest(router: &Router, body: &str) -> StatusCode {
    router
        .clone()
        .oneshot(
            Request::post("/event")
                .body(Body::from(body.to_owned()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_stream_headers() {
    let router = build_router(make_state());
    let response = router
        .oneshot(Request::get("/api/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(
        headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    assert_eq!(headers.get("x-accel-buffering").unwrap(), "no");
}

#[tokio::test]
async fn test_two_subscribers_then_one_disconnects() {
    let state = make_state();
    let router = build_router(Arc::clone(&state));

    let mut a = subscribe(&router).await;
    let mut b = subscribe(&router).await;
    assert_eq!(state.broadcaster.subscriber_count(), 2);

    assert_eq!(ingest(&router, r#"{"tool_name":"Edit"}"#).await, StatusCode::OK);
    assert_eq!(a.next_event().await["tool_name"], "Edit");
    assert_eq!(b.next_event().await["tool_name"], "Edit");

    drop(a);
    assert_eq!(state.broadcaster.subscriber_count(), 1);

    assert_eq!(ingest(&router, r#"{"tool_name":"Write"}"#).await, StatusCode::OK);
    let event = b.next_event().await;
    assert_eq!(event["tool_name"], "Write");
    assert_eq!(event["id"], 2);
}

#[tokio::test]
async fn test_frames_follow_sequence_order() {
    let router = build_router(make_state());
    let mut reader = subscribe(&router).await;

    for n in 0..10 {
        ingest(&router, &format!(r#"{{"tool_name":"T{n}"}}"#)).await;
    }

    let mut ids = Vec::new();
    for _ in 0..10 {
        ids.push(reader.next_event().await["id"].as_u64().unwrap());
    }
    assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_malformed_ingest_broadcasts_nothing() {
    let router = build_router(make_state());
    let mut reader = subscribe(&router).await;

    assert_eq!(ingest(&router, "{broken").await, StatusCode::BAD_REQUEST);
    reader.assert_quiet().await;

    ingest(&router, r#"{"tool_name":"Read"}"#).await;
    let event = reader.next_event().await;
    assert_eq!(event["id"], 1);
    assert_eq!(event["tool_name"], "Read");
}

#[tokio::test]
async fn test_last_event_id_replays_missed_events() {
    let router = build_router(make_state());
    for n in 1..=3 {
        ingest(&router, &format!(r#"{{"tool_name":"E{n}"}}"#)).await;
    }

    let mut reader = open_stream(
        &router,
        Request::get("/api/stream")
            .header("last-event-id", "1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(reader.next_event().await["tool_name"], "E2");
    assert_eq!(reader.next_event().await["tool_name"], "E3");

    ingest(&router, r#"{"tool_name":"E4"}"#).await;
    assert_eq!(reader.next_event().await["tool_name"], "E4");
}

#[tokio::test]
async fn test_since_query_replays_missed_events() {
    let router = build_router(make_state());
    for n in 1..=3 {
        ingest(&router, &format!(r#"{{"tool_name":"E{n}"}}"#)).await;
    }

    let mut reader = open_stream(
        &router,
        Request::get("/api/stream?since=2")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let event = reader.next_event().await;
    assert_eq!(event["tool_name"], "E3");
    assert_eq!(event["id"], 3);
}

#[tokio::test]
async fn test_stats_report_subscribers() {
    let router = build_router(make_state());
    let _reader = subscribe(&router).await;

    let response = router
        .clone()
        .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let stats: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(stats["subscribers"], 1);
}

#[tokio::test]
async fn test_stream_announces_instance() {
    let state = make_state();
    let router = build_router(Arc::clone(&state));
    let first = subscribe(&router).await;
    let second = subscribe(&router).await;

    assert_eq!(first.instance, state.broadcaster.instance().to_string());
    assert_eq!(first.instance, second.instance);
}

#[tokio::test]
async fn test_restarted_server_announces_new_instance() {
    let old_router = build_router(make_state());
    for n in 1..=5 {
        ingest(&old_router, &format!(r#"{{"tool_name":"E{n}"}}"#)).await;
    }
    let old = subscribe(&old_router).await;
    drop(old_router);

    // A client reconnecting with its old cursor sees a different instance,
    // and the new server's ids start below that cursor.
    let new_router = build_router(make_state());
    let mut reader = open_stream(
        &new_router,
        Request::get("/api/stream")
            .header("last-event-id", "5")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_ne!(reader.instance, old.instance);

    ingest(&new_router, r#"{"tool_name":"Read"}"#).await;
    assert_eq!(reader.next_event().await["id"], 1);
}

//! Server-Sent Events endpoint for live event streaming.
//!
//! Clients connect to `GET /api/stream` and receive one SSE frame per
//! event, in sequence order:
//!
//! ```text
//! id: 42
//! data: {"id":42,"timestamp":1700000000000,"tool_name":"Read",...}
//! ```
//!
//! Every stream opens with a named frame carrying the server's instance
//! id:
//!
//! ```text
//! event: instance
//! data: {"instance":"6f1c..."}
//! ```
//!
//! Sequence ids restart with the server, so a client that sees a new
//! instance drops the cursor and the events it already holds.
//!
//! A reconnecting client that sends `Last-Event-ID` (or `?since=`) first
//! receives the stored events it missed. When the connection closes the
//! response stream is dropped, which unregisters the subscriber.

use std::convert::Infallible;
use std::sync::Arc;

use agent_monitor_types::{InstanceId, SequenceId, ToolEvent};
use axum::extract::{Query, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{StreamExt as _, future, stream};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Header browsers send when `EventSource` reconnects.
const LAST_EVENT_ID: &str = "last-event-id";

/// Comment text written as the keep-alive heartbeat.
const HEARTBEAT_TEXT: &str = "hb";

/// Event name of the opening frame that identifies the server instance.
pub const INSTANCE_EVENT: &str = "instance";

/// Query parameters for `GET /api/stream`.
#[derive(Debug, serde::Deserialize)]
pub struct StreamQuery {
    /// Replay stored events with an id greater than this before going live.
    pub since: Option<u64>,
}

/// Open a live event stream.
///
/// # Route
///
/// `GET /api/stream`
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let since = params
        .since
        .map(SequenceId)
        .or_else(|| last_event_id(&headers));

    let subscription = state.broadcaster.subscribe(since)?;
    debug!(
        connection = %subscription.id(),
        since = ?since,
        backlog = subscription.backlog_len(),
        "stream client connected"
    );

    let frames = stream::iter(instance_frame(state.broadcaster.instance()))
        .chain(subscription.filter_map(|event| future::ready(to_frame(&event))))
        .map(Ok::<_, Infallible>);

    let keep_alive = KeepAlive::new()
        .interval(state.settings.heartbeat_interval)
        .text(HEARTBEAT_TEXT);

    Ok((
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        Sse::new(frames).keep_alive(keep_alive),
    ))
}

/// Encode one event as an SSE frame carrying its id.
fn to_frame(event: &ToolEvent) -> Option<Event> {
    match Event::default().id(event.id().to_string()).json_data(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!(id = %event.id(), error = %e, "failed to encode event frame");
            None
        }
    }
}

/// The opening frame naming this server instance.
fn instance_frame(instance: InstanceId) -> Option<Event> {
    match Event::default()
        .event(INSTANCE_EVENT)
        .json_data(serde_json::json!({ "instance": instance }))
    {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!(%instance, error = %e, "failed to encode instance frame");
            None
        }
    }
}

/// Parse the `Last-Event-ID` header, ignoring anything malformed.
fn last_event_id(headers: &HeaderMap) -> Option<SequenceId> {
    headers
        .get(LAST_EVENT_ID)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

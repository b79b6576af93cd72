//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Dashboard document |
//! | `POST` | `/event` | Ingest one event |
//! | `GET` | `/api/events` | Most recent events, oldest first |
//! | `GET` | `/api/stats` | Aggregate counts over stored events |
//! | `GET` | `/api/health` | Liveness and sizes |
//!
//! The live stream lives in [`crate::stream`].

use std::sync::Arc;

use agent_monitor_types::{SequenceId, ToolEvent, ToolStats};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::Uri;
use axum::response::{Html, IntoResponse};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Built-in dashboard served at `/`.
pub const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

// ---------------------------------------------------------------------------
// Query parameter and response structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/events` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Maximum number of events to return (default from configuration).
    pub limit: Option<usize>,
    /// Only return events with an id greater than this.
    pub since: Option<u64>,
}

/// Body returned by a successful `POST /event`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct IngestAck {
    /// Always `true`.
    pub ok: bool,
    /// The sequence id assigned to the event.
    pub id: SequenceId,
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// Serve the dashboard document.
///
/// A configured dashboard file is read on every request so edits show
/// up on reload; if it cannot be read the built-in page is served.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Some(path) = &state.settings.dashboard_path {
        match tokio::fs::read_to_string(path).await {
            Ok(page) => return Html(page),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "dashboard file unreadable, serving built-in page"
                );
            }
        }
    }
    Html(String::from(DASHBOARD_HTML))
}

// ---------------------------------------------------------------------------
// POST /event
// ---------------------------------------------------------------------------

/// Ingest one event.
///
/// Responds once the event is stored and enqueued for every subscriber;
/// never waits for a subscriber to consume it.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IngestAck>, ApiError> {
    let event = state.broadcaster.publish(&body).inspect_err(|e| {
        debug!(error = %e, bytes = body.len(), "rejected ingest payload");
    })?;
    Ok(Json(IngestAck {
        ok: true,
        id: event.id(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/events
// ---------------------------------------------------------------------------

/// Return the most recent events as a JSON array, oldest first.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<Vec<Arc<ToolEvent>>>, ApiError> {
    let limit = params.limit.unwrap_or(state.settings.snapshot_limit);
    let events = match params.since {
        Some(cursor) => state.broadcaster.since(SequenceId(cursor), limit)?,
        None => state.broadcaster.snapshot(limit)?,
    };
    Ok(Json(events))
}

// ---------------------------------------------------------------------------
// GET /api/stats
// ---------------------------------------------------------------------------

/// Return the stats aggregate over the stored events.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<ToolStats>, ApiError> {
    Ok(Json(state.broadcaster.stats()?))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Report liveness with the instance id, store size, and subscriber count.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(serde_json::json!({
        "status": "ok",
        "instance": state.broadcaster.instance(),
        "events": state.broadcaster.len()?,
        "capacity": state.broadcaster.capacity()?,
        "subscribers": state.broadcaster.subscriber_count(),
    })))
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// JSON 404 for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_owned())
}

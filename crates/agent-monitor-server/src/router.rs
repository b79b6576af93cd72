//! Axum router construction.
//!
//! Assembles all routes into a single [`Router`] with CORS enabled for
//! dashboards served from another origin and HTTP request tracing.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::stream;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- dashboard document
/// - `POST /event` -- ingest one event
/// - `GET /api/stream` -- SSE live stream
/// - `GET /api/events` -- recent events snapshot
/// - `GET /api/stats` -- aggregate counts
/// - `GET /api/health` -- liveness
///
/// Anything else gets a JSON 404.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/event", post(handlers::ingest))
        .route("/api/stream", get(stream::stream_events))
        .route("/api/events", get(handlers::list_events))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(state.settings.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP surface of the Agent Monitor.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **Ingest** (`POST /event`) -- one JSON object per tool call, handed
//!   to the [`Broadcaster`](agent_monitor_core::Broadcaster)
//! - **Live stream** (`GET /api/stream`) -- Server-Sent Events, one frame
//!   per event, resumable with `Last-Event-ID`
//! - **Snapshot** (`GET /api/events`) and **stats** (`GET /api/stats`)
//!   computed from the in-memory ring buffer
//! - **Dashboard** (`GET /`) -- a static HTML page consuming the above
//!
//! # Architecture
//!
//! Every request handler shares one [`AppState`] built at startup. The
//! ingest handler responds as soon as the event is stored and enqueued;
//! it never waits on a stream consumer. Each stream connection drains its
//! own bounded queue, so one slow viewer cannot stall ingestion or other
//! viewers.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod stream;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve, start_server};
pub use state::{AppState, HandlerSettings};

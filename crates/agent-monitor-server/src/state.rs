//! Shared application state for the HTTP server.
//!
//! [`AppState`] is the process-scoped context: it is constructed once at
//! startup, wrapped in [`Arc`], and injected into every handler via
//! Axum's `State` extractor.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agent_monitor_core::{Broadcaster, MonitorConfig};

/// Per-request knobs taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSettings {
    /// Default number of events returned by `GET /api/events`.
    pub snapshot_limit: usize,
    /// Idle time after which the stream writes a keep-alive comment.
    pub heartbeat_interval: Duration,
    /// Largest accepted ingest body, in bytes.
    pub max_body_bytes: usize,
    /// Dashboard file served at `/` instead of the built-in page.
    pub dashboard_path: Option<PathBuf>,
}

impl HandlerSettings {
    /// Extract handler settings from the monitor configuration.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            snapshot_limit: config.store.snapshot_limit,
            heartbeat_interval: Duration::from_millis(config.stream.heartbeat_interval_ms),
            max_body_bytes: config.server.max_body_bytes,
            dashboard_path: config.dashboard.path.clone(),
        }
    }
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The single write path and event history.
    pub broadcaster: Arc<Broadcaster>,
    /// Handler settings.
    pub settings: HandlerSettings,
}

impl AppState {
    /// Build the state from configuration.
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            broadcaster: Arc::new(Broadcaster::from_config(config)),
            settings: HandlerSettings::from_config(config),
        }
    }

    /// Build the state around an existing broadcaster.
    pub const fn with_broadcaster(broadcaster: Arc<Broadcaster>, settings: HandlerSettings) -> Self {
        Self {
            broadcaster,
            settings,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

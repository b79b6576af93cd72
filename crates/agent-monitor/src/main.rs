//! Agent Monitor server binary.
//!
//! Ingests tool-call events posted by the agent hook, keeps a bounded
//! history in memory, and streams every new event to connected
//! dashboards.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`agent-monitor.yaml` + environment overrides)
//! 2. Initialize structured logging (tracing)
//! 3. Build the shared application state
//! 4. Serve until Ctrl-C, then close live streams and drain

mod error;

use std::sync::Arc;

use agent_monitor_core::MonitorConfig;
use agent_monitor_server::{AppState, ServerConfig, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::MonitorError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server cannot
/// bind its port.
#[tokio::main]
async fn main() -> Result<(), MonitorError> {
    // 1. Load configuration. Logging is not up yet, so a failure here is
    //    reported through the returned error.
    let config = MonitorConfig::load()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        host = %config.server.host,
        port = config.server.port,
        max_events = config.store.max_events,
        snapshot_limit = config.store.snapshot_limit,
        subscriber_queue_capacity = config.stream.subscriber_queue_capacity,
        heartbeat_interval_ms = config.stream.heartbeat_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the process-scoped state shared by every handler.
    let state = Arc::new(AppState::new(&config));

    info!(
        dashboard = %format!("http://localhost:{}", config.server.port),
        hook_endpoint = %format!("http://localhost:{}/event", config.server.port),
        "Agent monitor starting"
    );

    // 4. Serve until interrupted.
    let server_config = ServerConfig::from(&config.server);
    start_server(&server_config, state, shutdown_signal()).await?;

    info!("Agent monitor stopped");
    Ok(())
}

/// Resolve when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C, shutting down");
    }
}

//! Error types for the monitor binary.
//!
//! [`MonitorError`] is the top-level error type that wraps every failure
//! mode during startup and serving.

/// Top-level error for the monitor binary.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: agent_monitor_core::config::ConfigError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: agent_monitor_server::ServerError,
    },
}

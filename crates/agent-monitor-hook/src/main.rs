//! Hook entry point for the Agent Monitor.
//!
//! The coding agent runs this once per tool invocation with the hook
//! payload on stdin. The payload is posted to the monitor's ingest
//! endpoint and the process exits. It always exits successfully: a
//! missing or unreachable monitor must never disturb the agent.
//!
//! The endpoint defaults to `http://localhost:7778/event` and can be
//! overridden with `AGENT_MONITOR_URL`.

mod relay;

use std::io::Read as _;
use std::process::ExitCode;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::relay::Relay;

/// Application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout is reserved for the agent's hook protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut input = Vec::new();
    if let Err(e) = std::io::stdin().read_to_end(&mut input) {
        warn!(error = %e, "could not read hook payload from stdin");
        return ExitCode::SUCCESS;
    }

    let url = relay::resolve_url(|name| std::env::var(name).ok());
    let relay = match Relay::new(url) {
        Ok(relay) => relay,
        Err(e) => {
            warn!(error = %e, "could not build HTTP client");
            return ExitCode::SUCCESS;
        }
    };

    if let Err(e) = relay.forward(&input).await {
        warn!(endpoint = relay.url(), error = %e, "event not delivered to monitor");
    }

    ExitCode::SUCCESS
}

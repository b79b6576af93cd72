//! Forwarding one hook payload to the ingest endpoint.

use std::time::Duration;

use serde_json::Value;

/// Ingest endpoint used when `AGENT_MONITOR_URL` is unset.
pub const DEFAULT_URL: &str = "http://localhost:7778/event";

/// Environment variable overriding the ingest endpoint.
pub const URL_ENV: &str = "AGENT_MONITOR_URL";

/// Upper bound on the whole POST, connect included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors that can occur while forwarding an event.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The hook payload is not JSON.
    #[error("payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    /// The hook payload is JSON but not an object.
    #[error("payload must be a JSON object")]
    NotAnObject,

    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The monitor answered with a non-success status.
    #[error("monitor rejected event with status {0}")]
    Rejected(u16),
}

/// Pick the ingest endpoint from the environment.
pub fn resolve_url<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(URL_ENV)
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_URL.to_owned())
}

/// HTTP client bound to one ingest endpoint.
#[derive(Debug)]
pub struct Relay {
    client: reqwest::Client,
    url: String,
}

impl Relay {
    /// Build a relay posting to `url`.
    pub fn new(url: String) -> Result<Self, HookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, url })
    }

    /// The endpoint events are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Validate `raw` as a JSON object and POST it.
    pub async fn forward(&self, raw: &[u8]) -> Result<(), HookError> {
        let payload: Value = serde_json::from_slice(raw)?;
        if !payload.is_object() {
            return Err(HookError::NotAnObject);
        }

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(HookError::Rejected(status.as_u16()))
        }
    }
}

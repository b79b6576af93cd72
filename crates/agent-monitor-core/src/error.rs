//! Error types for the ingestion core.

/// Errors raised by the [`Broadcaster`](crate::Broadcaster) write and read paths.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The payload could not be parsed as JSON.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The payload parsed, but is not a JSON object.
    #[error("payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A lock was poisoned by a panicking holder.
    ///
    /// Fatal to the request that observed it; the process keeps serving.
    #[error("internal state poisoned: {0}")]
    Poisoned(&'static str),
}

impl CoreError {
    /// Whether this error was caused by the client's input.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::MalformedPayload(_) | Self::NotAnObject(_))
    }
}

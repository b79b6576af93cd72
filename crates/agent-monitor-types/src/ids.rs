//! Identifier types.
//!
//! [`SequenceId`] is assigned by the server at ingestion and doubles as
//! the resumption cursor for stream subscribers. [`ConnectionId`] names
//! one open stream connection for the lifetime of that connection.
//! [`InstanceId`] names one server process; sequence ids are only
//! comparable between events carrying the same instance.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monotonically increasing id stamped on every ingested event.
///
/// Ids start at 1 and are never reused within a process. `0` is reserved
/// as the "nothing seen yet" cursor.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceId(pub u64);

impl SequenceId {
    /// The cursor that precedes every assigned id.
    pub const ZERO: Self = Self(0);

    /// The id that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Return the inner counter value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for SequenceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::str::FromStr for SequenceId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for SequenceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Unique identifier for one live stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one running server process.
///
/// Sequence ids restart at 1 with every process, so a client holding a
/// cursor must discard it when the instance changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    /// Create a new random instance identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_ids_order_and_advance() {
        let first = SequenceId::ZERO.next();
        assert_eq!(first, SequenceId(1));
        assert!(first.next() > first);
        assert_eq!(SequenceId(u64::MAX).next(), SequenceId(u64::MAX));
    }

    #[test]
    fn sequence_id_parses_cursor_text() {
        let parsed: SequenceId = " 42 ".parse().unwrap_or_default();
        assert_eq!(parsed, SequenceId(42));
        assert!("abc".parse::<SequenceId>().is_err());
    }

    #[test]
    fn sequence_id_serializes_as_number() {
        let json = serde_json::to_string(&SequenceId(7)).unwrap_or_default();
        assert_eq!(json, "7");
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn instance_id_serializes_as_plain_uuid() {
        let instance = InstanceId::new();
        let json = serde_json::to_string(&instance).unwrap_or_default();
        assert_eq!(json, format!("\"{instance}\""));
        assert_ne!(instance, InstanceId::new());
    }
}

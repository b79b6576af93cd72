//! The stamped tool-call event.
//!
//! The hook sends an arbitrary JSON object per tool invocation. The server
//! treats the payload as opaque except for a handful of well-known keys
//! used for stats, and stamps it with a [`SequenceId`] and a receipt
//! timestamp. On the wire the event is flat: the payload keys sit next to
//! `id` and `timestamp`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::SequenceId;

/// Tool name reported for events that carry no `tool_name` string.
pub const UNKNOWN_TOOL: &str = "unknown";

/// Keys inside `tool_input` that may carry the path a tool operated on,
/// in lookup order.
const INPUT_PATH_KEYS: [&str; 3] = ["file_path", "notebook_path", "path"];

/// Top-level keys consulted when `tool_input` carries no path.
const TOP_LEVEL_PATH_KEYS: [&str; 2] = ["file_path", "path"];

/// One ingested tool invocation.
///
/// Immutable once constructed. Server-stamped keys always win: any
/// `id` or `timestamp` the client sent is discarded by [`ToolEvent::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEvent {
    id: SequenceId,
    /// Receipt time in milliseconds since the Unix epoch.
    timestamp: i64,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl ToolEvent {
    /// Stamp a client payload with its sequence id and receipt time.
    pub fn new(id: SequenceId, timestamp: i64, mut payload: Map<String, Value>) -> Self {
        payload.remove("id");
        payload.remove("timestamp");
        Self {
            id,
            timestamp,
            payload,
        }
    }

    /// The server-assigned sequence id.
    pub const fn id(&self) -> SequenceId {
        self.id
    }

    /// Receipt time in milliseconds since the Unix epoch.
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The client payload without the stamped keys.
    pub const fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// The tool name, or [`UNKNOWN_TOOL`] if absent or not a string.
    pub fn tool_name(&self) -> &str {
        self.str_field("tool_name").unwrap_or(UNKNOWN_TOOL)
    }

    /// The `tool_input` object, if the payload carries one.
    pub fn tool_input(&self) -> Option<&Map<String, Value>> {
        self.payload.get("tool_input").and_then(Value::as_object)
    }

    /// The hook phase (`PreToolUse`, `PostToolUse`, ...), if present.
    pub fn hook_event_name(&self) -> Option<&str> {
        self.str_field("hook_event_name")
    }

    /// The agent session this event belongs to, if present.
    pub fn session_id(&self) -> Option<&str> {
        self.str_field("session_id")
    }

    /// The file path the tool operated on, if one can be found.
    ///
    /// Looks inside `tool_input` first, then at the top level.
    pub fn file_path(&self) -> Option<&str> {
        let from_input = self.tool_input().and_then(|input| {
            INPUT_PATH_KEYS
                .iter()
                .find_map(|key| input.get(*key).and_then(Value::as_str))
        });
        from_input
            .or_else(|| TOP_LEVEL_PATH_KEYS.iter().find_map(|key| self.str_field(key)))
            .filter(|path| !path.is_empty())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

//! Tool categorization and the derived stats aggregate.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::SequenceId;

/// Coarse grouping of tool names used by the dashboard and stats.
///
/// Unknown tool names map to [`ToolCategory::Other`], so new tools added
/// to the agent show up without a server change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Reading file contents.
    Read,
    /// Searching or listing the file tree.
    Search,
    /// Creating or modifying files.
    Write,
    /// Running shell commands.
    Shell,
    /// Fetching or searching the web.
    Web,
    /// Delegating to sub-agents or managing the agent's own plan.
    Agent,
    /// Anything not recognized.
    Other,
}

impl ToolCategory {
    /// Classify a tool by name.
    pub fn classify(tool_name: &str) -> Self {
        match tool_name {
            "Read" | "NotebookRead" => Self::Read,
            "Grep" | "Glob" | "LS" => Self::Search,
            "Edit" | "MultiEdit" | "Write" | "NotebookEdit" => Self::Write,
            "Bash" | "BashOutput" | "KillShell" | "KillBash" => Self::Shell,
            "WebFetch" | "WebSearch" => Self::Web,
            "Task" | "TodoWrite" | "ExitPlanMode" => Self::Agent,
            _ => Self::Other,
        }
    }
}

/// Aggregate view over the events currently held in the store.
///
/// Recomputed on every request; never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStats {
    /// Number of events currently in the store.
    pub total_events: u64,
    /// Number of events ingested since the process started.
    pub total_ingested: u64,
    /// Event count per tool name.
    pub tool_counts: BTreeMap<String, u64>,
    /// Event count per [`ToolCategory`].
    pub category_counts: BTreeMap<ToolCategory, u64>,
    /// Distinct paths read by read-category tools, sorted.
    pub files_read: BTreeSet<String>,
    /// Distinct paths modified by write-category tools, sorted.
    pub files_written: BTreeSet<String>,
    /// Distinct paths touched by any tool, sorted.
    pub files_touched: BTreeSet<String>,
    /// Oldest sequence id still held, if any.
    pub first_id: Option<SequenceId>,
    /// Newest sequence id held, if any.
    pub last_id: Option<SequenceId>,
    /// Number of live stream subscribers.
    pub subscribers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_tools() {
        assert_eq!(ToolCategory::classify("Read"), ToolCategory::Read);
        assert_eq!(ToolCategory::classify("Grep"), ToolCategory::Search);
        assert_eq!(ToolCategory::classify("MultiEdit"), ToolCategory::Write);
        assert_eq!(ToolCategory::classify("Bash"), ToolCategory::Shell);
        assert_eq!(ToolCategory::classify("WebFetch"), ToolCategory::Web);
        assert_eq!(ToolCategory::classify("Task"), ToolCategory::Agent);
    }

    #[test]
    fn unknown_tools_are_other() {
        assert_eq!(ToolCategory::classify("mcp__github__create_issue"), ToolCategory::Other);
        assert_eq!(ToolCategory::classify(""), ToolCategory::Other);
    }

    #[test]
    fn category_counts_serialize_with_snake_case_keys() {
        let mut stats = ToolStats::default();
        stats.category_counts.insert(ToolCategory::Shell, 2);
        let json = serde_json::to_value(&stats).unwrap_or_default();
        assert_eq!(json["category_counts"]["shell"], 2);
        assert!(json["first_id"].is_null());
    }
}

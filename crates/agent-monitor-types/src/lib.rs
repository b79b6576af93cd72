//! Shared type definitions for the Agent Monitor.
//!
//! These types cross the wire between the ingest server and the
//! dashboard, so their JSON shape is part of the public contract.
//!
//! # Modules
//!
//! - [`ids`] -- Sequence ids for stored events, connection ids for stream subscribers, and the server instance id
//! - [`event`] -- The stamped [`ToolEvent`] record
//! - [`stats`] -- Tool categorization and the derived [`ToolStats`] aggregate

pub mod event;
pub mod ids;
pub mod stats;

pub use event::ToolEvent;
pub use ids::{ConnectionId, InstanceId, SequenceId};
pub use stats::{ToolCategory, ToolStats};

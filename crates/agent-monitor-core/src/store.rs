//! Bounded in-memory event history.
//!
//! [`EventStore`] is a fixed-capacity ring buffer: appends are O(1) and,
//! once full, each append evicts the oldest event. It also owns the
//! sequence counter, so assigning an id and appending are a single step
//! and store order always equals id order.
//!
//! The store is not synchronized itself; the
//! [`Broadcaster`](crate::Broadcaster) wraps it in a lock.

use std::collections::VecDeque;
use std::sync::Arc;

use agent_monitor_types::{SequenceId, ToolEvent};
use serde_json::{Map, Value};

/// Fixed-capacity, oldest-evicting event buffer.
#[derive(Debug)]
pub struct EventStore {
    events: VecDeque<Arc<ToolEvent>>,
    capacity: usize,
    last_id: SequenceId,
    total_appended: u64,
}

impl EventStore {
    /// Create an empty store holding at most `capacity` events.
    ///
    /// A capacity of 0 is raised to 1; configuration validation rejects
    /// it before it gets here.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            last_id: SequenceId::ZERO,
            total_appended: 0,
        }
    }

    /// Stamp `payload` with the next sequence id and `timestamp`, then append it.
    ///
    /// Evicts the oldest event when the store is full. Returns the stored
    /// event, which carries the assigned id.
    pub fn append(&mut self, payload: Map<String, Value>, timestamp: i64) -> Arc<ToolEvent> {
        self.last_id = self.last_id.next();
        let event = Arc::new(ToolEvent::new(self.last_id, timestamp, payload));

        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Arc::clone(&event));
        self.total_appended = self.total_appended.saturating_add(1);

        event
    }

    /// The most recent `limit` events, oldest first.
    pub fn snapshot(&self, limit: usize) -> Vec<Arc<ToolEvent>> {
        let skip = self.events.len().saturating_sub(limit);
        self.events.iter().skip(skip).cloned().collect()
    }

    /// The full buffer contents, oldest first.
    pub fn all(&self) -> Vec<Arc<ToolEvent>> {
        self.events.iter().cloned().collect()
    }

    /// Events with an id greater than `cursor`, oldest first.
    ///
    /// At most the most recent `limit` of them are returned.
    pub fn since(&self, cursor: SequenceId, limit: usize) -> Vec<Arc<ToolEvent>> {
        let start = self.events.partition_point(|event| event.id() <= cursor);
        let available = self.events.len().saturating_sub(start);
        let skip = start.saturating_add(available.saturating_sub(limit));
        self.events.iter().skip(skip).cloned().collect()
    }

    /// Iterate over the stored events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ToolEvent> {
        self.events.iter().map(AsRef::as_ref)
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the store holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of events held.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recently assigned id, or [`SequenceId::ZERO`] before the first append.
    pub const fn last_id(&self) -> SequenceId {
        self.last_id
    }

    /// Number of events appended since creation, including evicted ones.
    pub const fn total_appended(&self) -> u64 {
        self.total_appended
    }
}

//! The single write path: validate, stamp, store, fan out.
//!
//! [`Broadcaster`] is the process-scoped context shared by every request
//! handler. It is built once at startup and torn down with
//! [`Broadcaster::shutdown`].
//!
//! Lock order is always store, then registry. Publishing holds the store
//! write lock across append and fan-out, which keeps every subscriber's
//! queue in store order. Subscribing holds the store read lock while it
//! registers and copies the backlog, so the backlog and the live queue
//! neither overlap nor leave a gap.
//!
//! Each broadcaster carries a fresh [`InstanceId`]. Sequence ids restart
//! with the process, so clients compare instances before trusting a
//! cursor they kept across a reconnect.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use agent_monitor_types::{InstanceId, SequenceId, ToolEvent, ToolStats};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::registry::SubscriberRegistry;
use crate::stats;
use crate::store::EventStore;
use crate::subscription::Subscription;

/// Shared event store plus subscriber registry.
#[derive(Debug)]
pub struct Broadcaster {
    instance: InstanceId,
    store: RwLock<EventStore>,
    registry: Arc<SubscriberRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster with the given ring buffer capacity and
    /// per-subscriber queue capacity.
    pub fn new(max_events: usize, queue_capacity: usize) -> Self {
        Self {
            instance: InstanceId::new(),
            store: RwLock::new(EventStore::new(max_events)),
            registry: Arc::new(SubscriberRegistry::new(queue_capacity)),
        }
    }

    /// Create a broadcaster sized from configuration.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.store.max_events,
            config.stream.subscriber_queue_capacity,
        )
    }

    /// The id of this server process.
    pub const fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Parse a raw request body and publish it.
    ///
    /// The body must be a JSON object. On error nothing is stored or
    /// broadcast.
    pub fn publish(&self, raw: &[u8]) -> Result<Arc<ToolEvent>, CoreError> {
        let value: Value = serde_json::from_slice(raw)?;
        match value {
            Value::Object(payload) => self.publish_payload(payload),
            other => Err(CoreError::NotAnObject(json_kind(&other))),
        }
    }

    /// Stamp, store, and fan out an already-parsed payload.
    ///
    /// Both locks are taken before the event is appended, so a poisoned
    /// lock leaves the store untouched.
    pub fn publish_payload(
        &self,
        payload: Map<String, Value>,
    ) -> Result<Arc<ToolEvent>, CoreError> {
        let mut store = self.write_store()?;
        let (event, outcome) = self
            .registry
            .fan_out_with(|| store.append(payload, Utc::now().timestamp_millis()))?;
        drop(store);

        debug!(
            id = %event.id(),
            tool = event.tool_name(),
            delivered = outcome.delivered,
            dropped = outcome.dropped,
            "event published"
        );
        Ok(event)
    }

    /// Register a live subscriber.
    ///
    /// With a `since` cursor, events after it that are still in the store
    /// are queued ahead of live events.
    pub fn subscribe(&self, since: Option<SequenceId>) -> Result<Subscription, CoreError> {
        let store = self.read_store()?;
        let (id, rx) = self.registry.register()?;
        let backlog = since.map_or_else(Vec::new, |cursor| store.since(cursor, store.capacity()));
        drop(store);

        debug!(connection = %id, backlog = backlog.len(), "stream subscribed");
        Ok(Subscription::new(id, backlog, rx, Arc::clone(&self.registry)))
    }

    /// The most recent `limit` events, oldest first.
    pub fn snapshot(&self, limit: usize) -> Result<Vec<Arc<ToolEvent>>, CoreError> {
        Ok(self.read_store()?.snapshot(limit))
    }

    /// Up to `limit` of the most recent events after `cursor`, oldest first.
    pub fn since(
        &self,
        cursor: SequenceId,
        limit: usize,
    ) -> Result<Vec<Arc<ToolEvent>>, CoreError> {
        Ok(self.read_store()?.since(cursor, limit))
    }

    /// Every stored event, oldest first.
    pub fn all(&self) -> Result<Vec<Arc<ToolEvent>>, CoreError> {
        Ok(self.read_store()?.all())
    }

    /// Compute the stats aggregate over the current store contents.
    pub fn stats(&self) -> Result<ToolStats, CoreError> {
        let store = self.read_store()?;
        Ok(stats::aggregate(
            store.iter(),
            store.total_appended(),
            self.registry.len(),
        ))
    }

    /// Number of stored events.
    pub fn len(&self) -> Result<usize, CoreError> {
        Ok(self.read_store()?.len())
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.read_store()?.is_empty())
    }

    /// Ring buffer capacity.
    pub fn capacity(&self) -> Result<usize, CoreError> {
        Ok(self.read_store()?.capacity())
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Disconnect every subscriber so open streams finish.
    pub fn shutdown(&self) {
        let closed = self.registry.close_all();
        info!(closed, "broadcaster shut down");
    }

    fn read_store(&self) -> Result<RwLockReadGuard<'_, EventStore>, CoreError> {
        self.store
            .read()
            .map_err(|_poisoned| CoreError::Poisoned("event store"))
    }

    fn write_store(&self) -> Result<RwLockWriteGuard<'_, EventStore>, CoreError> {
        self.store
            .write()
            .map_err(|_poisoned| CoreError::Poisoned("event store"))
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

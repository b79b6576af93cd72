//! Registry of live stream subscribers.
//!
//! Each subscriber owns a bounded [`mpsc`] queue. The registry holds the
//! sending half; the stream connection holds the receiving half and is
//! its only reader. Delivery uses `try_send`, so a full or closed queue
//! never blocks the publisher: the subscriber is removed on the spot
//! and the rest of the fan-out continues.
//!
//! All membership changes and every fan-out run under one mutex. Once
//! [`SubscriberRegistry::unregister`] returns, no further event reaches
//! that subscriber, and a subscriber registered before a fan-out started
//! is always included in it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use agent_monitor_types::{ConnectionId, ToolEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::error::CoreError;

/// One registered stream connection.
#[derive(Debug)]
pub struct Subscriber {
    id: ConnectionId,
    tx: mpsc::Sender<Arc<ToolEvent>>,
    connected_at: Instant,
}

impl Subscriber {
    /// The connection id.
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// When the subscriber registered.
    pub const fn connected_at(&self) -> Instant {
        self.connected_at
    }

    /// Enqueue an event without waiting.
    pub fn try_deliver(&self, event: &Arc<ToolEvent>) -> Result<(), DeliveryFailure> {
        self.tx.try_send(Arc::clone(event)).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryFailure::QueueFull,
            TrySendError::Closed(_) => DeliveryFailure::Disconnected,
        })
    }
}

/// Why an event could not be handed to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The subscriber's queue is at capacity.
    QueueFull,
    /// The receiving side has been dropped.
    Disconnected,
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Subscribers the event was enqueued for.
    pub delivered: usize,
    /// Subscribers removed because delivery failed.
    pub dropped: usize,
}

/// Set of currently connected stream subscribers.
#[derive(Debug)]
pub struct SubscriberRegistry {
    subscribers: Mutex<BTreeMap<ConnectionId, Subscriber>>,
    queue_capacity: usize,
}

impl SubscriberRegistry {
    /// Create an empty registry whose subscribers each get a queue of
    /// `queue_capacity` events (raised to 1 if zero).
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(BTreeMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Register a new subscriber and hand back its queue's receiving half.
    pub fn register(
        &self,
    ) -> Result<(ConnectionId, mpsc::Receiver<Arc<ToolEvent>>), CoreError> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let id = ConnectionId::new();
        let mut subscribers = self.lock()?;
        subscribers.insert(
            id,
            Subscriber {
                id,
                tx,
                connected_at: Instant::now(),
            },
        );
        debug!(connection = %id, active = subscribers.len(), "subscriber registered");
        Ok((id, rx))
    }

    /// Remove a subscriber. Returns whether it was still registered.
    ///
    /// Tolerates a poisoned lock so it can run from `Drop`.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let removed = subscribers.remove(&id);
        if let Some(subscriber) = &removed {
            debug!(
                connection = %id,
                connected_ms = subscriber.connected_at.elapsed().as_millis(),
                active = subscribers.len(),
                "subscriber unregistered"
            );
        }
        removed.is_some()
    }

    /// Apply `deliver` to every registered subscriber.
    ///
    /// Subscribers for which `deliver` fails are removed inside the same
    /// critical section and counted in [`FanOut::dropped`].
    pub fn for_each_active<F>(&self, deliver: F) -> Result<FanOut, CoreError>
    where
        F: FnMut(&Subscriber) -> Result<(), DeliveryFailure>,
    {
        let mut subscribers = self.lock()?;
        Ok(retain_delivered(&mut subscribers, deliver))
    }

    /// Enqueue `event` for every registered subscriber.
    pub fn fan_out(&self, event: &Arc<ToolEvent>) -> Result<FanOut, CoreError> {
        self.for_each_active(|subscriber| subscriber.try_deliver(event))
    }

    /// Produce an event under the registry lock, then enqueue it for every
    /// registered subscriber.
    ///
    /// `produce` runs only once the lock is held, so a poisoned registry
    /// fails before anything is produced.
    pub fn fan_out_with<F>(&self, produce: F) -> Result<(Arc<ToolEvent>, FanOut), CoreError>
    where
        F: FnOnce() -> Arc<ToolEvent>,
    {
        let mut subscribers = self.lock()?;
        let event = produce();
        let outcome = retain_delivered(&mut subscribers, |subscriber| {
            subscriber.try_deliver(&event)
        });
        Ok((event, outcome))
    }

    /// Number of registered subscribers.
    ///
    /// A poisoned lock still yields the recovered count, with a warning.
    pub fn len(&self) -> usize {
        match self.subscribers.lock() {
            Ok(subscribers) => subscribers.len(),
            Err(poisoned) => {
                warn!("subscriber registry lock poisoned, reporting recovered count");
                poisoned.into_inner().len()
            }
        }
    }

    /// Whether no subscribers are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of each subscriber's queue.
    pub const fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Drop every subscriber, ending their streams once they drain.
    ///
    /// Returns the number of subscribers closed.
    pub fn close_all(&self) -> usize {
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let closed = subscribers.len();
        subscribers.clear();
        closed
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<ConnectionId, Subscriber>>, CoreError> {
        self.subscribers
            .lock()
            .map_err(|_poisoned| CoreError::Poisoned("subscriber registry"))
    }

    /// Poison the registry lock by panicking while holding it.
    #[cfg(test)]
    #[allow(clippy::unwrap_used, clippy::panic)]
    pub(crate) fn poison(&self) {
        let panicked = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = self.subscribers.lock().unwrap();
                    panic!("registry poisoned");
                })
                .join()
                .is_err()
        });
        assert!(panicked);
    }
}

/// Deliver to every subscriber in `subscribers`, dropping the failures.
fn retain_delivered<F>(
    subscribers: &mut BTreeMap<ConnectionId, Subscriber>,
    mut deliver: F,
) -> FanOut
where
    F: FnMut(&Subscriber) -> Result<(), DeliveryFailure>,
{
    let mut outcome = FanOut::default();
    subscribers.retain(|id, subscriber| match deliver(subscriber) {
        Ok(()) => {
            outcome.delivered = outcome.delivered.saturating_add(1);
            true
        }
        Err(DeliveryFailure::QueueFull) => {
            warn!(connection = %id, "subscriber queue full, disconnecting");
            outcome.dropped = outcome.dropped.saturating_add(1);
            false
        }
        Err(DeliveryFailure::Disconnected) => {
            debug!(connection = %id, "subscriber gone, removing");
            outcome.dropped = outcome.dropped.saturating_add(1);
            false
        }
    });
    outcome
}

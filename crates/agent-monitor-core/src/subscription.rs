//! A live stream subscription.
//!
//! [`Subscription`] yields the catch-up backlog captured at subscribe
//! time, then every event fanned out afterwards. Dropping it unregisters
//! the subscriber, whichever way the stream loop exits.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use agent_monitor_types::{ConnectionId, ToolEvent};
use futures::Stream;
use tokio::sync::mpsc;

use crate::registry::SubscriberRegistry;

/// Receiving end of one subscriber's queue, plus its registration.
#[derive(Debug)]
pub struct Subscription {
    id: ConnectionId,
    backlog: VecDeque<Arc<ToolEvent>>,
    rx: mpsc::Receiver<Arc<ToolEvent>>,
    registry: Arc<SubscriberRegistry>,
}

impl Subscription {
    pub(crate) fn new(
        id: ConnectionId,
        backlog: Vec<Arc<ToolEvent>>,
        rx: mpsc::Receiver<Arc<ToolEvent>>,
        registry: Arc<SubscriberRegistry>,
    ) -> Self {
        Self {
            id,
            backlog: backlog.into(),
            rx,
            registry,
        }
    }

    /// The connection id this subscription is registered under.
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Number of catch-up events not yet yielded.
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the subscriber has been disconnected (queue
    /// overflow or server shutdown) and its queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<ToolEvent>> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = Arc<ToolEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(event) = this.backlog.pop_front() {
            return Poll::Ready(Some(event));
        }
        this.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

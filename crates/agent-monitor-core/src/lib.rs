//! Ingestion and live-broadcast core for the Agent Monitor.
//!
//! Every ingested event flows through one write path:
//!
//! ```text
//! raw payload --> Broadcaster::publish --> EventStore (ring buffer)
//!                                     \--> SubscriberRegistry --> per-subscriber queue
//! ```
//!
//! The [`Broadcaster`] serializes id assignment, append, and fan-out
//! under the store's write lock, so the store and every subscriber see
//! the same sequence in the same order. Each subscriber owns a bounded
//! queue; an enqueue never blocks, and a subscriber whose queue
//! overflows is disconnected rather than slowing the writer.

pub mod broadcaster;
pub mod config;
pub mod error;
pub mod registry;
pub mod stats;
pub mod store;
pub mod subscription;

pub use broadcaster::Broadcaster;
pub use config::MonitorConfig;
pub use error::CoreError;
pub use registry::{FanOut, SubscriberRegistry};
pub use store::EventStore;
pub use subscription::Subscription;

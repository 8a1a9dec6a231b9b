//! Pub/sub bus adapter.
//!
//! The dashboard and the thermostat never speak directly; they rendezvous
//! on a bus channel named after the thermostat id. [`Bus`] is the thin
//! capability the control bridge consumes: subscribe, unsubscribe,
//! publish, presence. [`BusClient`] implements it over the bus provider's
//! REST surface with a long-poll subscribe loop.
//!
//! The adapter does not retry publishes, buffer, or reorder. Messages are
//! delivered in arrival order through a broadcast channel.

mod client;

pub use client::{BusClient, BusConfig};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Error;

/// Capability set of the third-party pub/sub service.
///
/// All operations are asynchronous. `subscribe` resolves once the session
/// is established -- a subscribe error is the only bus failure the bridge
/// surfaces to its caller; everything else is fire-and-forget.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Begin delivery of messages published to `channel`.
    ///
    /// Resolves when the bus session is established, yielding a receiver
    /// of inbound JSON payloads in arrival order.
    async fn subscribe(
        &self,
        channel: &str,
    ) -> Result<broadcast::Receiver<Arc<serde_json::Value>>, Error>;

    /// Stop delivery for `channel`. A no-op when not subscribed.
    async fn unsubscribe(&self, channel: &str);

    /// Publish a JSON payload to `channel`. Best-effort, no delivery
    /// receipt.
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), Error>;

    /// Snapshot of the member ids currently subscribed to `channel`.
    async fn presence(&self, channel: &str) -> Result<Vec<String>, Error>;
}

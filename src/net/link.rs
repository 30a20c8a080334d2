//! The transport capability the node publishes through.
//!
//! Wire-level encoding, socket handling and wireless association internals
//! all live behind [`BrokerLink`]; the node only cares about the operations
//! below. Inbound traffic is exposed as a pollable queue rather than a
//! registered callback so the single-threaded loop can drain it at its own
//! suspension points.

use anyhow::Result;
use async_trait::async_trait;

/// Wireless network credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Network name.
    pub ssid: String,
    /// Network passphrase.
    pub password: String,
}

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message arrived on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// Capability: pub/sub transport with a wireless uplink.
///
/// # Contract
/// - `associate` and `connect_broker` return `Ok(false)` for ordinary
///   unavailability (the caller retries); `Err` is reserved for structural
///   failures that retrying cannot fix
/// - `publish` requires an established broker session
/// - `is_connected` reports the broker session only; association state is
///   implied by it
#[async_trait]
pub trait BrokerLink: Send {
    /// Associate with the wireless network.
    async fn associate(&mut self, credentials: &Credentials) -> Result<bool>;

    /// Open a broker session under the given client id.
    async fn connect_broker(&mut self, host: &str, port: u16, client_id: &str) -> Result<bool>;

    /// Subscribe to a topic on the current session.
    async fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Publish a payload; `Ok(false)` means the broker refused the message.
    async fn publish(&mut self, topic: &str, payload: &str) -> Result<bool>;

    /// Whether the broker session is currently alive.
    fn is_connected(&self) -> bool;

    /// Take the next pending inbound message, if any.
    fn try_recv(&mut self) -> Option<InboundMessage>;
}

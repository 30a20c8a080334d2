//! In-process transport simulation.
//!
//! [`SimulatedLink`] stands in for the radio + broker client so the node can
//! run end-to-end on a development machine. It records every subscription and
//! publish, can fail a configurable number of start-up attempts to exercise
//! the retry loops, and can drop the broker session on demand. Tests drive it
//! directly; the binary uses it as its default transport.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::net::link::{BrokerLink, Credentials, InboundMessage};

/// Simulated [`BrokerLink`] with scriptable start-up failures.
pub struct SimulatedLink {
    associated: bool,
    connected: bool,
    association_failures: u32,
    broker_failures: u32,
    subscriptions: Vec<String>,
    published: Vec<(String, String)>,
    inbound: VecDeque<InboundMessage>,
    published_while_disconnected: bool,
}

impl SimulatedLink {
    /// A link that succeeds on the first attempt at every layer.
    pub fn new() -> Self {
        Self {
            associated: false,
            connected: false,
            association_failures: 0,
            broker_failures: 0,
            subscriptions: Vec::new(),
            published: Vec::new(),
            inbound: VecDeque::new(),
            published_while_disconnected: false,
        }
    }

    /// Fail the first `association_failures` association attempts and the
    /// first `broker_failures` broker connection attempts.
    pub fn with_flaky_startup(mut self, association_failures: u32, broker_failures: u32) -> Self {
        self.association_failures = association_failures;
        self.broker_failures = broker_failures;
        self
    }

    /// Kill the broker session, as a transient outage would.
    pub fn drop_session(&mut self) {
        self.connected = false;
    }

    /// Queue an inbound message for delivery via `try_recv`.
    pub fn push_inbound(&mut self, topic: &str, payload: &[u8]) {
        self.inbound.push_back(InboundMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
    }

    /// Every `(topic, payload)` pair published so far.
    pub fn published(&self) -> &[(String, String)] {
        &self.published
    }

    /// Every topic subscribed so far, including re-subscriptions.
    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    /// Whether a publish was ever attempted without a broker session.
    /// The orchestrator's readiness gate must keep this false.
    pub fn published_while_disconnected(&self) -> bool {
        self.published_while_disconnected
    }
}

impl Default for SimulatedLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerLink for SimulatedLink {
    async fn associate(&mut self, credentials: &Credentials) -> Result<bool> {
        sleep(Duration::from_millis(20)).await;
        if self.association_failures > 0 {
            self.association_failures -= 1;
            return Ok(false);
        }
        self.associated = true;
        info!(ssid = %credentials.ssid, "simulated link associated");
        Ok(true)
    }

    async fn connect_broker(&mut self, host: &str, port: u16, client_id: &str) -> Result<bool> {
        sleep(Duration::from_millis(20)).await;
        if !self.associated {
            return Ok(false);
        }
        if self.broker_failures > 0 {
            self.broker_failures -= 1;
            return Ok(false);
        }
        self.connected = true;
        info!(host, port, client_id, "simulated broker session open");
        Ok(true)
    }

    async fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &str) -> Result<bool> {
        if !self.connected {
            self.published_while_disconnected = true;
            return Ok(false);
        }
        info!(topic, payload, "publish");
        self.published.push((topic.to_string(), payload.to_string()));
        Ok(true)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn try_recv(&mut self) -> Option<InboundMessage> {
        self.inbound.pop_front()
    }
}

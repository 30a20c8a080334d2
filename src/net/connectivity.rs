//! Connectivity state machine.
//!
//! [`ConnectivityManager`] owns the network-association and broker-session
//! lifecycle. [`ensure_ready`](ConnectivityManager::ensure_ready) blocks
//! until the node may publish: it never returns "not connected". Absence of
//! connectivity shows up as latency; the node prefers link availability over
//! loop responsiveness. An optional attempt cap turns that into a structured
//! [`NodeError::Transport`] for deployments that want a watchdog-visible
//! failure instead.
//!
//! The manager is the only mutator of [`ConnectionState`]. It re-subscribes
//! to the control topic every time the broker session is (re-)established,
//! and drains inbound control messages on each call, logging them only; no
//! command semantics are attached.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};
use crate::net::link::{BrokerLink, Credentials};

/// Where the node sits in the bring-up sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing established yet.
    Disconnected,
    /// Trying to associate with the wireless network.
    NetworkConnecting,
    /// Network link up, broker session not yet opened.
    NetworkConnected,
    /// Trying to open the broker session.
    BrokerConnecting,
    /// Fully connected; publishing is permitted.
    BrokerConnected,
}

/// Owns the transport and gates publishing on full connectivity.
pub struct ConnectivityManager<L> {
    link: L,
    state: ConnectionState,
    credentials: Credentials,
    broker_host: String,
    broker_port: u16,
    client_id: String,
    control_topic: String,
    network_retry_delay: Duration,
    broker_retry_delay: Duration,
    max_attempts: Option<u32>,
}

impl<L: BrokerLink> ConnectivityManager<L> {
    /// Build a manager around `link` from the node configuration.
    pub fn new(link: L, config: &NodeConfig) -> Self {
        let device_id = config.node.device_id.clone();
        Self {
            link,
            state: ConnectionState::Disconnected,
            credentials: Credentials {
                ssid: config.network.ssid.clone(),
                password: config.network.password.clone(),
            },
            broker_host: config.broker.host.clone(),
            broker_port: config.broker.port,
            control_topic: format!("{}/output", device_id),
            client_id: device_id,
            network_retry_delay: config.connectivity.network_retry_delay,
            broker_retry_delay: config.connectivity.broker_retry_delay,
            max_attempts: config.connectivity.max_attempts,
        }
    }

    /// Current state. Only this manager mutates it.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The transport. Callers may publish through it only while
    /// [`state`](Self::state) is [`ConnectionState::BrokerConnected`].
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Read-only transport access.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Block until the broker session is established.
    ///
    /// Idempotent and safe to call every cycle: a healthy session returns
    /// immediately, a dropped one is detected and rebuilt. With the default
    /// configuration this retries forever; a configured attempt cap makes it
    /// fail with [`NodeError::Transport`] once exceeded.
    pub async fn ensure_ready(&mut self) -> NodeResult<()> {
        self.drain_inbound();

        if self.state == ConnectionState::BrokerConnected && !self.link.is_connected() {
            warn!("broker session lost, reconnecting");
            self.state = ConnectionState::BrokerConnecting;
        }

        let mut attempts: u32 = 0;
        while self.state != ConnectionState::BrokerConnected {
            match self.state {
                ConnectionState::Disconnected => {
                    info!(ssid = %self.credentials.ssid, "bringing up network link");
                    self.state = ConnectionState::NetworkConnecting;
                }
                ConnectionState::NetworkConnecting => {
                    if self
                        .link
                        .associate(&self.credentials)
                        .await
                        .map_err(transport_err)?
                    {
                        info!(ssid = %self.credentials.ssid, "network associated");
                        self.state = ConnectionState::NetworkConnected;
                    } else {
                        attempts += 1;
                        self.check_attempts(attempts)?;
                        sleep(self.network_retry_delay).await;
                    }
                }
                ConnectionState::NetworkConnected => {
                    self.state = ConnectionState::BrokerConnecting;
                }
                ConnectionState::BrokerConnecting => {
                    if self
                        .link
                        .connect_broker(&self.broker_host, self.broker_port, &self.client_id)
                        .await
                        .map_err(transport_err)?
                    {
                        self.link
                            .subscribe(&self.control_topic)
                            .await
                            .map_err(transport_err)?;
                        info!(
                            host = %self.broker_host,
                            port = self.broker_port,
                            control_topic = %self.control_topic,
                            "broker session established"
                        );
                        self.state = ConnectionState::BrokerConnected;
                    } else {
                        attempts += 1;
                        self.check_attempts(attempts)?;
                        sleep(self.broker_retry_delay).await;
                    }
                }
                ConnectionState::BrokerConnected => {}
            }
        }
        Ok(())
    }

    fn check_attempts(&self, attempts: u32) -> NodeResult<()> {
        match self.max_attempts {
            Some(max) if attempts >= max => Err(NodeError::Transport(format!(
                "gave up after {} connection attempts",
                attempts
            ))),
            _ => Ok(()),
        }
    }

    fn drain_inbound(&mut self) {
        while let Some(message) = self.link.try_recv() {
            // Control messages are logged only; no command semantics
            debug!(
                topic = %message.topic,
                payload = %String::from_utf8_lossy(&message.payload),
                "inbound control message"
            );
        }
    }
}

fn transport_err(err: anyhow::Error) -> NodeError {
    NodeError::Transport(err.to_string())
}

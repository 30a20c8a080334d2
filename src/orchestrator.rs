//! The per-cycle driver.
//!
//! One cycle: block until connectivity is ready, pull a batch from the
//! metric source, offer it to the publisher, pause. Components never call
//! each other directly; the orchestrator is the only cross-component caller,
//! so data flows strictly downstream and the publisher can never be reached
//! while the broker session is down.
//!
//! The whole node is one logical thread: the retry delays, the inter-sample
//! pauses and the end-of-cycle pause are the only suspension points, and a
//! cycle always runs to completion once entered.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{NodeError, NodeResult};
use crate::net::connectivity::ConnectivityManager;
use crate::net::link::BrokerLink;
use crate::publish::{OfferOutcome, TelemetryPublisher};
use crate::source::MetricSource;

/// What one cycle did with its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Batch accepted; this many metrics went to the broker.
    Published(usize),
    /// Batch dropped by the publish gate.
    RateLimited,
    /// Sampling produced an invalid reading; nothing was offered.
    Skipped,
}

/// Ties connectivity, sampling and publishing into the run loop.
pub struct Orchestrator<L, M> {
    connectivity: ConnectivityManager<L>,
    source: M,
    publisher: TelemetryPublisher,
    cycle_pause: Duration,
}

impl<L: BrokerLink, M: MetricSource> Orchestrator<L, M> {
    /// Assemble the pipeline.
    pub fn new(
        connectivity: ConnectivityManager<L>,
        source: M,
        publisher: TelemetryPublisher,
        cycle_pause: Duration,
    ) -> Self {
        Self {
            connectivity,
            source,
            publisher,
            cycle_pause,
        }
    }

    /// The connectivity manager, for state inspection.
    pub fn connectivity(&self) -> &ConnectivityManager<L> {
        &self.connectivity
    }

    /// Mutable connectivity access, used by tests to drive the link.
    pub fn connectivity_mut(&mut self) -> &mut ConnectivityManager<L> {
        &mut self.connectivity
    }

    /// One-time start-up. Sensor initialization failure is fatal here;
    /// there is no degraded mode.
    pub async fn init(&mut self) -> NodeResult<()> {
        self.source.init().await
    }

    /// Run a single cycle: ensure readiness, sample, offer.
    pub async fn run_cycle(&mut self) -> NodeResult<CycleOutcome> {
        self.connectivity.ensure_ready().await?;

        let batch = match self.source.sample().await {
            Ok(batch) => batch,
            Err(NodeError::InvalidReading(reason)) => {
                warn!(%reason, "invalid reading, skipping this cycle's publish");
                return Ok(CycleOutcome::Skipped);
            }
            Err(other) => return Err(other),
        };

        let outcome = self
            .publisher
            .offer(self.connectivity.link_mut(), &batch)
            .await?;
        Ok(match outcome {
            OfferOutcome::Published(count) => CycleOutcome::Published(count),
            OfferOutcome::RateLimited => CycleOutcome::RateLimited,
        })
    }

    /// Initialize and loop forever.
    pub async fn run(&mut self) -> NodeResult<()> {
        self.init().await?;
        info!("telemetry pipeline started");
        loop {
            self.run_cycle().await?;
            sleep(self.cycle_pause).await;
        }
    }
}

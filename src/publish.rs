//! Outbound metric publishing with rate limiting.
//!
//! [`TelemetryPublisher`] owns the [`PublishGate`] and the payload format.
//! An offered batch is all-or-nothing: if the minimum interval since the last
//! accepted batch has not elapsed, the whole batch is dropped — never queued
//! or retried. Accepted metrics are formatted as fixed-precision ASCII
//! decimals capped at the fixed 8-byte payload width and published to
//! `{device_id}/{suffix}`.
//!
//! The caller is responsible for only offering while the broker session is
//! up; the orchestrator checks readiness once per cycle.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{NodeError, NodeResult};
use crate::net::link::BrokerLink;

/// Fixed payload buffer width on the wire; wider values truncate.
const MAX_PAYLOAD_BYTES: usize = 8;

/// One named scalar headed for the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Topic suffix, appended to the device id.
    pub suffix: String,
    /// The value to publish.
    pub value: f64,
    /// Fractional digits in the payload (2 for frequencies and
    /// temperature-like values, 4 for RMS).
    pub precision: usize,
}

impl Metric {
    /// Convenience constructor.
    pub fn new(suffix: impl Into<String>, value: f64, precision: usize) -> Self {
        Self {
            suffix: suffix.into(),
            value,
            precision,
        }
    }
}

/// Result of offering a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// The batch passed the gate; this many metrics were accepted by the
    /// broker.
    Published(usize),
    /// The minimum interval had not elapsed; the batch was dropped.
    RateLimited,
}

/// Minimum-interval throttle over accepted batches.
#[derive(Debug)]
pub struct PublishGate {
    last_publish: Option<Instant>,
    min_interval: Duration,
}

impl PublishGate {
    /// Gate that admits at most one batch per `min_interval`.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_publish: None,
            min_interval,
        }
    }

    fn is_open(&self, now: Instant) -> bool {
        match self.last_publish {
            None => true,
            Some(last) => now.duration_since(last) >= self.min_interval,
        }
    }

    fn record(&mut self, now: Instant) {
        self.last_publish = Some(now);
    }
}

/// Formats and rate-gates outbound metric batches.
pub struct TelemetryPublisher {
    device_id: String,
    gate: PublishGate,
}

impl TelemetryPublisher {
    /// Publisher for `device_id` with the given minimum batch interval.
    pub fn new(device_id: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            device_id: device_id.into(),
            gate: PublishGate::new(min_interval),
        }
    }

    /// Offer one cycle's batch.
    ///
    /// Requires an established broker session. The gate timestamp is updated
    /// only after the accepted batch has gone out, so a rate-limited batch
    /// never pushes the next window back.
    pub async fn offer<L: BrokerLink>(
        &mut self,
        link: &mut L,
        batch: &[Metric],
    ) -> NodeResult<OfferOutcome> {
        if !self.gate.is_open(Instant::now()) {
            debug!(metrics = batch.len(), "batch dropped by publish gate");
            return Ok(OfferOutcome::RateLimited);
        }

        let mut accepted = 0usize;
        for metric in batch {
            let topic = format!("{}/{}", self.device_id, metric.suffix);
            let payload = format_fixed(metric.value, metric.precision);
            match link.publish(&topic, &payload).await {
                Ok(true) => accepted += 1,
                Ok(false) => warn!(%topic, "broker refused publish"),
                Err(err) => return Err(NodeError::Transport(err.to_string())),
            }
        }

        self.gate.record(Instant::now());
        Ok(OfferOutcome::Published(accepted))
    }
}

/// Fixed-precision decimal formatting, capped at the payload buffer width.
fn format_fixed(value: f64, precision: usize) -> String {
    let mut payload = format!("{:.*}", precision, value);
    payload.truncate(MAX_PAYLOAD_BYTES);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::sim::SimulatedLink;
    use crate::net::link::Credentials;

    async fn connected_link() -> SimulatedLink {
        let mut link = SimulatedLink::new();
        let creds = Credentials {
            ssid: "lab".into(),
            password: "hunter2".into(),
        };
        assert!(link.associate(&creds).await.unwrap());
        assert!(link.connect_broker("broker.local", 1883, "dev").await.unwrap());
        link
    }

    fn batch() -> Vec<Metric> {
        vec![
            Metric::new("freq_x", 101.5625, 2),
            Metric::new("rms_x", 0.70710678, 4),
        ]
    }

    #[test]
    fn formats_with_fixed_precision() {
        assert_eq!(format_fixed(101.5625, 2), "101.56");
        assert_eq!(format_fixed(0.70710678, 4), "0.7071");
        assert_eq!(format_fixed(-3.0, 2), "-3.00");
    }

    #[test]
    fn wide_values_truncate_to_payload_buffer() {
        assert_eq!(format_fixed(123456.789, 2), "123456.7");
        assert_eq!(format_fixed(-98765.4321, 4), "-98765.4");
    }

    #[tokio::test(start_paused = true)]
    async fn first_offer_passes_the_gate() {
        let mut link = connected_link().await;
        let mut publisher = TelemetryPublisher::new("vib-node-01", Duration::from_secs(5));

        let outcome = publisher.offer(&mut link, &batch()).await.unwrap();

        assert_eq!(outcome, OfferOutcome::Published(2));
        assert_eq!(
            link.published(),
            &[
                ("vib-node-01/freq_x".to_string(), "101.56".to_string()),
                ("vib-node-01/rms_x".to_string(), "0.7071".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_offer_inside_interval_is_dropped() {
        let mut link = connected_link().await;
        let mut publisher = TelemetryPublisher::new("vib-node-01", Duration::from_millis(5000));

        publisher.offer(&mut link, &batch()).await.unwrap();
        tokio::time::advance(Duration::from_millis(4000)).await;
        let outcome = publisher.offer(&mut link, &batch()).await.unwrap();

        assert_eq!(outcome, OfferOutcome::RateLimited);
        assert_eq!(link.published().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn offer_at_exactly_the_interval_is_accepted() {
        let mut link = connected_link().await;
        let mut publisher = TelemetryPublisher::new("vib-node-01", Duration::from_millis(5000));

        publisher.offer(&mut link, &batch()).await.unwrap();
        tokio::time::advance(Duration::from_millis(5000)).await;
        let outcome = publisher.offer(&mut link, &batch()).await.unwrap();

        assert_eq!(outcome, OfferOutcome::Published(2));
        assert_eq!(link.published().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_batch_does_not_move_the_gate() {
        let mut link = connected_link().await;
        let mut publisher = TelemetryPublisher::new("vib-node-01", Duration::from_millis(5000));

        publisher.offer(&mut link, &batch()).await.unwrap();
        tokio::time::advance(Duration::from_millis(4000)).await;
        publisher.offer(&mut link, &batch()).await.unwrap(); // dropped
        tokio::time::advance(Duration::from_millis(1000)).await;

        // 5s after the *accepted* batch, not the dropped one
        let outcome = publisher.offer(&mut link, &batch()).await.unwrap();
        assert_eq!(outcome, OfferOutcome::Published(2));
    }
}

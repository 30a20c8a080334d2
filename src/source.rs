//! Metric sources.
//!
//! A [`MetricSource`] produces one named batch of metrics per cycle. The
//! connect/sample/publish loop lives once in the orchestrator; sensor
//! personalities are source variants:
//!
//! - [`ScalarSource`] — one metric from one probe (load-cell style)
//! - [`MultiScalarSource`] — several metrics from several probes
//!   (temperature/humidity style)
//! - [`VibrationSource`] — windowed capture plus spectral analysis,
//!   emitting three dominant frequencies and three RMS values

use async_trait::async_trait;
use tracing::debug;

use crate::acquisition::AcquisitionScheduler;
use crate::dsp::SignalProcessor;
use crate::error::{NodeError, NodeResult};
use crate::hardware::{Accelerometer, ScalarProbe};
use crate::publish::Metric;

/// Fractional digits for frequency and temperature-like values.
pub const SCALAR_PRECISION: usize = 2;
/// Fractional digits for RMS energy values.
pub const RMS_PRECISION: usize = 4;

/// Anything that can produce a batch of metrics once per cycle.
#[async_trait]
pub trait MetricSource: Send {
    /// One-time start-up. A failure here is fatal to the node.
    async fn init(&mut self) -> NodeResult<()> {
        Ok(())
    }

    /// Produce this cycle's batch. An [`NodeError::InvalidReading`] skips
    /// the cycle's publish without stopping the node.
    async fn sample(&mut self) -> NodeResult<Vec<Metric>>;
}

/// One named metric read from a single probe.
pub struct ScalarSource {
    channel: ScalarChannel,
}

/// Several named metrics, each from its own probe.
pub struct MultiScalarSource {
    channels: Vec<ScalarChannel>,
}

/// A named probe binding used by the scalar sources.
pub struct ScalarChannel {
    name: String,
    precision: usize,
    probe: Box<dyn ScalarProbe>,
}

impl ScalarChannel {
    /// Bind `probe` to the metric `name`.
    pub fn new(name: impl Into<String>, precision: usize, probe: Box<dyn ScalarProbe>) -> Self {
        Self {
            name: name.into(),
            precision,
            probe,
        }
    }

    async fn read(&mut self) -> NodeResult<Metric> {
        let value = self
            .probe
            .read()
            .await
            .map_err(|e| NodeError::InvalidReading(e.to_string()))?;
        if !value.is_finite() {
            return Err(NodeError::InvalidReading(format!(
                "{} read non-finite value {}",
                self.name, value
            )));
        }
        Ok(Metric::new(self.name.clone(), value, self.precision))
    }
}

impl ScalarSource {
    /// Source producing one metric per cycle.
    pub fn new(name: impl Into<String>, precision: usize, probe: Box<dyn ScalarProbe>) -> Self {
        Self {
            channel: ScalarChannel::new(name, precision, probe),
        }
    }
}

#[async_trait]
impl MetricSource for ScalarSource {
    async fn sample(&mut self) -> NodeResult<Vec<Metric>> {
        Ok(vec![self.channel.read().await?])
    }
}

impl MultiScalarSource {
    /// Source producing one metric per channel per cycle.
    pub fn new(channels: Vec<ScalarChannel>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl MetricSource for MultiScalarSource {
    async fn sample(&mut self) -> NodeResult<Vec<Metric>> {
        let mut batch = Vec::with_capacity(self.channels.len());
        for channel in &mut self.channels {
            batch.push(channel.read().await?);
        }
        Ok(batch)
    }
}

/// The spectral-analysis source: capture one window, analyze all three axes.
pub struct VibrationSource<S> {
    scheduler: AcquisitionScheduler<S>,
    processor: SignalProcessor,
}

impl<S: Accelerometer> VibrationSource<S> {
    /// Pair a capture scheduler with a signal processor.
    ///
    /// # Panics
    /// Panics if the scheduler's sample count differs from the processor's
    /// window size. Both come from the same configuration value in practice.
    pub fn new(scheduler: AcquisitionScheduler<S>, processor: SignalProcessor) -> Self {
        assert_eq!(
            scheduler.sample_count(),
            processor.window_size(),
            "capture window and analysis window must agree"
        );
        Self {
            scheduler,
            processor,
        }
    }
}

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

#[async_trait]
impl<S: Accelerometer> MetricSource for VibrationSource<S> {
    async fn init(&mut self) -> NodeResult<()> {
        self.scheduler
            .sensor_mut()
            .init()
            .await
            .map_err(|e| NodeError::SensorInit(e.to_string()))
    }

    async fn sample(&mut self) -> NodeResult<Vec<Metric>> {
        let window = self
            .scheduler
            .capture_window()
            .await
            .map_err(|e| NodeError::InvalidReading(e.to_string()))?;
        let realized_rate = window.realized_rate();
        debug!(
            captured_at = %window.captured_at(),
            realized_rate_hz = realized_rate,
            "analyzing capture window"
        );

        let per_axis: Vec<_> = (0..3)
            .map(|axis| self.processor.analyze(window.axis(axis), realized_rate))
            .collect();

        let mut batch = Vec::with_capacity(6);
        for (axis, metrics) in AXIS_NAMES.iter().zip(per_axis.iter()) {
            batch.push(Metric::new(
                format!("freq_{}", axis),
                metrics.spectrum.dominant_frequency_hz,
                SCALAR_PRECISION,
            ));
        }
        for (axis, metrics) in AXIS_NAMES.iter().zip(per_axis.iter()) {
            batch.push(Metric::new(
                format!("rms_{}", axis),
                metrics.rms.rms,
                RMS_PRECISION,
            ));
        }
        Ok(batch)
    }
}

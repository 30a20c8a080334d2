//! Fixed-size sample capture with wall-clock rate measurement.
//!
//! [`AcquisitionScheduler`] pulls acceleration triples from an
//! [`Accelerometer`] until exactly N samples per axis are collected, pausing
//! a fixed interval between pulls to approximate the target sampling rate.
//! The elapsed time around the whole loop is measured so the *realized* rate
//! can be computed per window; jitter is expected, so the rate is never
//! cached across windows.
//!
//! The returned [`AcquisitionWindow`] is moved into the analysis pass and
//! discarded afterwards; nothing here is shared.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::hardware::Accelerometer;

/// One filled capture window: N samples for each of the three axes.
#[derive(Debug)]
pub struct AcquisitionWindow {
    axes: [Vec<f64>; 3],
    captured_at: DateTime<Utc>,
    started: Instant,
    finished: Instant,
}

impl AcquisitionWindow {
    /// Samples per axis.
    pub fn sample_count(&self) -> usize {
        self.axes[0].len()
    }

    /// Samples for one axis (0 = x, 1 = y, 2 = z).
    pub fn axis(&self, index: usize) -> &[f64] {
        &self.axes[index]
    }

    /// Wall-clock timestamp of the capture start.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Sampling rate actually achieved while this window was filled,
    /// in Hz: `N / elapsed_seconds`.
    pub fn realized_rate(&self) -> f64 {
        let elapsed = self.finished.duration_since(self.started).as_secs_f64();
        self.sample_count() as f64 / elapsed
    }
}

/// Drives one capture window at a time from an accelerometer.
pub struct AcquisitionScheduler<S> {
    sensor: S,
    sample_count: usize,
    sample_pause: Duration,
}

impl<S: Accelerometer> AcquisitionScheduler<S> {
    /// Create a scheduler capturing `sample_count` samples per window with
    /// `sample_pause` between sensor pulls.
    pub fn new(sensor: S, sample_count: usize, sample_pause: Duration) -> Self {
        Self {
            sensor,
            sample_count,
            sample_pause,
        }
    }

    /// Access the underlying sensor, e.g. for start-up initialization.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Samples captured per window.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Fill one window. Blocks for the full window duration
    /// (roughly `sample_count * sample_pause`).
    pub async fn capture_window(&mut self) -> Result<AcquisitionWindow> {
        let n = self.sample_count;
        let mut axes = [
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
        ];

        let captured_at = Utc::now();
        let started = Instant::now();
        for _ in 0..n {
            let [x, y, z] = self.sensor.read_triple().await?;
            axes[0].push(x);
            axes[1].push(y);
            axes[2].push(z);
            sleep(self.sample_pause).await;
        }
        let finished = Instant::now();

        let window = AcquisitionWindow {
            axes,
            captured_at,
            started,
            finished,
        };
        trace!(
            samples = n,
            realized_rate_hz = window.realized_rate(),
            "capture window filled"
        );
        Ok(window)
    }
}

//! Mock sensor implementations.
//!
//! Simulated devices for running the node without physical hardware.
//! The mock accelerometer synthesizes a configurable sinusoid per axis so a
//! known dominant frequency shows up in the published metrics.

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use tracing::info;

use crate::hardware::capabilities::{Accelerometer, ScalarProbe};

/// Per-axis synthetic signal: `offset + amplitude * sin(2π * frequency * t)`.
#[derive(Debug, Clone, Copy)]
pub struct AxisSignal {
    /// Tone frequency in Hz.
    pub frequency_hz: f64,
    /// Tone amplitude in g.
    pub amplitude: f64,
    /// Constant offset in g (e.g. gravity on the vertical axis).
    pub offset: f64,
}

/// Simulated 3-axis accelerometer.
///
/// Each call to `read_triple` evaluates the configured per-axis tones at the
/// next nominal sample instant and adds uniform noise. Time is synthesized
/// from the nominal sampling rate, not the wall clock, so tests get an exact
/// known spectrum.
pub struct MockAccelerometer {
    axes: [AxisSignal; 3],
    nominal_rate_hz: f64,
    noise_amplitude: f64,
    sample_index: u64,
}

impl MockAccelerometer {
    /// Create a mock with a 100 Hz, 1 g tone on every axis and gravity on z.
    pub fn new(nominal_rate_hz: f64) -> Self {
        let tone = AxisSignal {
            frequency_hz: 100.0,
            amplitude: 1.0,
            offset: 0.0,
        };
        Self {
            axes: [
                tone,
                tone,
                AxisSignal {
                    offset: 1.0,
                    ..tone
                },
            ],
            nominal_rate_hz,
            noise_amplitude: 0.0,
            sample_index: 0,
        }
    }

    /// Create a mock with explicit per-axis signals.
    pub fn with_signals(nominal_rate_hz: f64, axes: [AxisSignal; 3]) -> Self {
        Self {
            axes,
            nominal_rate_hz,
            noise_amplitude: 0.0,
            sample_index: 0,
        }
    }

    /// Add uniform noise of the given amplitude to every reading.
    pub fn with_noise(mut self, noise_amplitude: f64) -> Self {
        self.noise_amplitude = noise_amplitude;
        self
    }
}

#[async_trait]
impl Accelerometer for MockAccelerometer {
    async fn init(&mut self) -> Result<()> {
        info!(rate_hz = self.nominal_rate_hz, "mock accelerometer ready");
        Ok(())
    }

    async fn read_triple(&mut self) -> Result<[f64; 3]> {
        let t = self.sample_index as f64 / self.nominal_rate_hz;
        self.sample_index += 1;

        let mut rng = rand::thread_rng();
        let mut triple = [0.0; 3];
        for (value, signal) in triple.iter_mut().zip(self.axes.iter()) {
            let tone = signal.amplitude
                * (2.0 * std::f64::consts::PI * signal.frequency_hz * t).sin();
            let noise = if self.noise_amplitude > 0.0 {
                rng.gen_range(-self.noise_amplitude..=self.noise_amplitude)
            } else {
                0.0
            };
            *value = signal.offset + tone + noise;
        }
        Ok(triple)
    }
}

/// Simulated thermometer: a base temperature with slow uniform jitter.
pub struct MockThermometer {
    base_celsius: f64,
    jitter: f64,
}

impl MockThermometer {
    /// Create a thermometer reading around `base_celsius`.
    pub fn new(base_celsius: f64) -> Self {
        Self {
            base_celsius,
            jitter: 0.3,
        }
    }
}

#[async_trait]
impl ScalarProbe for MockThermometer {
    async fn read(&mut self) -> Result<f64> {
        let mut rng = rand::thread_rng();
        Ok(self.base_celsius + rng.gen_range(-self.jitter..=self.jitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accelerometer_tracks_configured_tone() {
        let mut sensor = MockAccelerometer::with_signals(
            1000.0,
            [AxisSignal {
                frequency_hz: 250.0,
                amplitude: 2.0,
                offset: 0.0,
            }; 3],
        );
        sensor.init().await.unwrap();

        // 250 Hz at 1 kHz sampling: 0, +2, 0, -2, ...
        let first = sensor.read_triple().await.unwrap();
        let second = sensor.read_triple().await.unwrap();
        assert!(first[0].abs() < 1e-9);
        assert!((second[0] - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn thermometer_stays_near_base() {
        let mut probe = MockThermometer::new(21.0);
        for _ in 0..16 {
            let value = probe.read().await.unwrap();
            assert!((value - 21.0).abs() <= 0.3);
        }
    }
}

//! Pure signal processing for vibration analysis.
//!
//! [`SignalProcessor`] turns one axis worth of time-domain samples into a
//! [`SpectralEstimate`] (dominant frequency and peak magnitude) and an
//! [`RmsEstimate`]. The pipeline is: subtract the mean (detrend), apply a
//! Hamming window, run a forward FFT, take per-bin magnitudes, and scan the
//! positive-frequency bins for the peak with the DC bin excluded.
//!
//! RMS is computed separately from the *raw* samples, so a constant offset
//! (e.g. gravity on the vertical axis) contributes to the reported energy.
//! Callers who want AC-only vibration energy select [`RmsMode::AcCoupled`]
//! instead.
//!
//! This module performs no I/O and holds no mutable state across calls.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// How RMS energy is computed from a capture window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RmsMode {
    /// RMS over the raw samples: any constant offset (gravity included)
    /// shows up in the reported energy.
    #[default]
    Raw,
    /// RMS over the detrended samples: AC-only vibration energy.
    AcCoupled,
}

/// Dominant-frequency estimate for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralEstimate {
    /// Frequency of the strongest non-DC bin, in Hz.
    pub dominant_frequency_hz: f64,
    /// Magnitude of that bin.
    pub peak_magnitude: f64,
}

/// RMS energy estimate for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmsEstimate {
    /// Root-mean-square of the window's samples.
    pub rms: f64,
}

/// Combined per-axis analysis result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMetrics {
    /// Spectral peak information.
    pub spectrum: SpectralEstimate,
    /// Signal energy.
    pub rms: RmsEstimate,
}

/// Windowed-FFT analyzer for fixed-size sample blocks.
pub struct SignalProcessor {
    window_size: usize,
    fft: Arc<dyn Fft<f64>>,
    hamming: Vec<f64>,
    rms_mode: RmsMode,
}

impl SignalProcessor {
    /// Create a processor for blocks of `window_size` samples.
    ///
    /// # Panics
    /// Panics if `window_size` is not a power of two >= 2. Callers get this
    /// from validated configuration.
    pub fn new(window_size: usize, rms_mode: RmsMode) -> Self {
        assert!(
            window_size >= 2 && window_size.is_power_of_two(),
            "window size must be a power of two >= 2"
        );

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);

        let mut hamming = Vec::with_capacity(window_size);
        for i in 0..window_size {
            // Hamming window formula
            let val = 0.54
                - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / (window_size - 1) as f64).cos();
            hamming.push(val);
        }

        Self {
            window_size,
            fft,
            hamming,
            rms_mode,
        }
    }

    /// Number of samples expected per [`analyze`](Self::analyze) call.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Analyze one axis of a capture window.
    ///
    /// `realized_rate` is the sampling rate actually achieved while the
    /// window was filled; frequency resolution is `realized_rate / N`.
    ///
    /// # Panics
    /// Panics if `samples.len()` differs from the configured window size.
    pub fn analyze(&self, samples: &[f64], realized_rate: f64) -> AxisMetrics {
        assert_eq!(
            samples.len(),
            self.window_size,
            "sample block does not match window size"
        );

        let n = self.window_size;
        let mean = samples.iter().sum::<f64>() / n as f64;

        // Detrended + windowed copy feeds the transform only
        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .zip(self.hamming.iter())
            .map(|(&x, &w)| Complex::new((x - mean) * w, 0.0))
            .collect();

        self.fft.process(&mut buffer);

        let magnitudes: Vec<f64> = buffer[..n / 2].iter().map(|c| c.norm()).collect();
        let (peak_bin, peak_magnitude) = peak_bin(&magnitudes);

        let dominant_frequency_hz = peak_bin as f64 * realized_rate / n as f64;

        let rms = match self.rms_mode {
            RmsMode::Raw => rms_of(samples.iter().copied()),
            RmsMode::AcCoupled => rms_of(samples.iter().map(|&x| x - mean)),
        };

        AxisMetrics {
            spectrum: SpectralEstimate {
                dominant_frequency_hz,
                peak_magnitude,
            },
            rms: RmsEstimate { rms },
        }
    }
}

/// Scan the half-spectrum for its strongest bin, excluding DC (index 0).
///
/// The strictly-greater comparison keeps the earliest bin on ties, and an
/// all-zero spectrum stays at bin 0 so no spurious positive frequency is
/// reported.
fn peak_bin(magnitudes: &[f64]) -> (usize, f64) {
    let mut peak = (0usize, 0.0f64);
    for (bin, &magnitude) in magnitudes.iter().enumerate().skip(1) {
        if magnitude > peak.1 {
            peak = (bin, magnitude);
        }
    }
    peak
}

fn rms_of(samples: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    (samples.map(|x| x * x).sum::<f64>() / n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 128;
    const RATE: f64 = 1000.0;

    fn sine(frequency: f64, amplitude: f64, offset: f64) -> Vec<f64> {
        (0..N)
            .map(|i| {
                let t = i as f64 / RATE;
                offset + amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn sinusoid_peak_within_one_bin() {
        let processor = SignalProcessor::new(N, RmsMode::Raw);
        let metrics = processor.analyze(&sine(100.0, 1.0, 0.0), RATE);

        let resolution = RATE / N as f64; // 7.8125 Hz
        assert!(
            (metrics.spectrum.dominant_frequency_hz - 100.0).abs() <= resolution,
            "dominant frequency {} not within one bin of 100 Hz",
            metrics.spectrum.dominant_frequency_hz
        );
        assert!((metrics.rms.rms - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.02);
    }

    #[test]
    fn constant_signal_rms_equals_magnitude() {
        let processor = SignalProcessor::new(N, RmsMode::Raw);
        let metrics = processor.analyze(&[-2.5; N], RATE);

        assert!((metrics.rms.rms - 2.5).abs() < 1e-12);
        // Detrending removes the constant entirely, so no peak survives
        assert_eq!(metrics.spectrum.dominant_frequency_hz, 0.0);
    }

    #[test]
    fn all_zero_signal_reports_zero() {
        let processor = SignalProcessor::new(N, RmsMode::Raw);
        let metrics = processor.analyze(&[0.0; N], RATE);

        assert_eq!(metrics.rms.rms, 0.0);
        assert_eq!(metrics.spectrum.dominant_frequency_hz, 0.0);
        assert_eq!(metrics.spectrum.peak_magnitude, 0.0);
    }

    #[test]
    fn dc_offset_excluded_from_peak_search() {
        // Large gravity-style offset with a small 100 Hz ripple on top
        let processor = SignalProcessor::new(N, RmsMode::Raw);
        let metrics = processor.analyze(&sine(100.0, 0.1, 10.0), RATE);

        let resolution = RATE / N as f64;
        assert!((metrics.spectrum.dominant_frequency_hz - 100.0).abs() <= resolution);
        // Raw RMS still carries the offset energy
        assert!((metrics.rms.rms - 10.0).abs() < 0.01);
    }

    #[test]
    fn ac_coupled_mode_drops_the_offset() {
        let processor = SignalProcessor::new(N, RmsMode::AcCoupled);
        let metrics = processor.analyze(&sine(100.0, 0.1, 10.0), RATE);

        assert!((metrics.rms.rms - 0.1 * std::f64::consts::FRAC_1_SQRT_2).abs() < 0.005);
    }

    #[test]
    fn peak_scan_breaks_ties_toward_earliest_bin() {
        assert_eq!(peak_bin(&[5.0, 2.0, 3.0, 3.0, 1.0]), (2, 3.0));
    }

    #[test]
    fn peak_scan_ignores_dc_bin() {
        assert_eq!(peak_bin(&[9.0, 1.0, 0.5, 0.25]), (1, 1.0));
    }

    #[test]
    fn peak_scan_of_flat_zero_spectrum_stays_at_dc() {
        assert_eq!(peak_bin(&[0.0; 8]), (0, 0.0));
    }
}

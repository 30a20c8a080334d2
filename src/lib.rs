//! # vibenode
//!
//! A vibration telemetry node: it samples a 3-axis accelerometer into
//! fixed-size windows, derives per-axis vibration metrics (dominant
//! frequency via a windowed FFT, RMS energy) and publishes them to a
//! pub/sub broker, keeping network and broker connectivity alive across
//! transient failures.
//!
//! ## Crate structure
//!
//! - **`config`**: Strongly-typed configuration loaded from TOML and
//!   environment variables, with post-load validation.
//! - **`error`**: The central `NodeError` enum.
//! - **`trace`**: Tracing/logging initialization.
//! - **`hardware`**: Sensor capability traits and mock implementations.
//! - **`acquisition`**: Fixed-size window capture with realized-rate
//!   measurement.
//! - **`dsp`**: Pure signal processing — detrend, Hamming window, FFT,
//!   peak pick, RMS.
//! - **`net`**: The `BrokerLink` transport capability, the connectivity
//!   state machine, and a simulated link.
//! - **`publish`**: Publish gate and payload formatting.
//! - **`source`**: Metric sources (scalar, multi-scalar, vibration).
//! - **`orchestrator`**: The per-cycle driver tying it all together.

pub mod acquisition;
pub mod config;
pub mod dsp;
pub mod error;
pub mod hardware;
pub mod net;
pub mod orchestrator;
pub mod publish;
pub mod source;
pub mod trace;

pub use error::{NodeError, NodeResult};

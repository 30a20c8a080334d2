//! Atomic sensor capabilities.
//!
//! Each capability trait:
//! - Is async (uses `#[async_trait]`)
//! - Requires `Send` so sources can hold drivers across await points
//! - Uses `anyhow::Result` for errors
//! - Focuses on ONE thing
//!
//! A vibration sensor implements [`Accelerometer`]; simpler one-value devices
//! (thermometers, load cells) implement [`ScalarProbe`]. Pipeline code takes
//! trait bounds, never concrete drivers.

use anyhow::Result;
use async_trait::async_trait;

/// Capability: 3-axis acceleration readout.
///
/// # Contract
/// - `init` is called exactly once before any read; failure is fatal to the
///   node (there is no degraded mode without its primary sensor)
/// - After a successful `init`, `read_triple` always yields a value; bus-level
///   retries are the driver's concern
/// - Values are in physical units (g), already calibrated
#[async_trait]
pub trait Accelerometer: Send {
    /// Bring up the device. Called once at start-up.
    async fn init(&mut self) -> Result<()>;

    /// Read one `[x, y, z]` acceleration triple.
    async fn read_triple(&mut self) -> Result<[f64; 3]>;
}

/// Capability: single scalar readout.
///
/// Covers sensors that produce one value per poll (temperature, humidity,
/// weight). The meaning and unit of the value belong to the metric the
/// caller attaches it to.
#[async_trait]
pub trait ScalarProbe: Send {
    /// Read the current value.
    async fn read(&mut self) -> Result<f64>;
}

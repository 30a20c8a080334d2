//! Sensor capability traits and mock implementations.
//!
//! Devices implement the small capability traits from [`capabilities`]; the
//! rest of the pipeline is written against those trait bounds so it never
//! touches a concrete driver. [`mock`] provides simulated sensors for running
//! and testing without physical hardware.

pub mod capabilities;
pub mod mock;

pub use capabilities::{Accelerometer, ScalarProbe};
pub use mock::{MockAccelerometer, MockThermometer};

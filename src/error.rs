//! Custom error types for the node.
//!
//! This module defines the primary error type, `NodeError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different kinds of failures the node can hit:
//!
//! - **`Config`**: Wraps errors from figment, typically file parsing or
//!   missing-field issues in the configuration sources.
//! - **`Configuration`**: Semantic errors in the configuration, such as a
//!   sample count that is not a power of two. These are caught during the
//!   validation step after extraction.
//! - **`Io`**: Wraps standard `std::io::Error`.
//! - **`SensorInit`**: The sensor could not be brought up at start-up. This is
//!   fatal: the node exits with a structured error instead of degrading.
//! - **`InvalidReading`**: A sensor produced an unusable value. The current
//!   cycle's publish is skipped; the node keeps running.
//! - **`Transport`**: A structural failure in the network/broker link, as
//!   opposed to ordinary unavailability (which is absorbed by the
//!   connectivity retry loop and never surfaces as an error).
//!
//! By using `#[from]`, `NodeError` can be seamlessly created from underlying
//! error types, simplifying error handling with the `?` operator.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type NodeResult<T> = std::result::Result<T, NodeError>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum NodeError {
    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration loaded but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// File or network I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sensor could not be initialized at start-up. Fatal.
    #[error("Sensor initialization failed: {0}")]
    SensorInit(String),

    /// A sensor produced an unusable value; the cycle's publish is skipped.
    #[error("Invalid sensor reading: {0}")]
    InvalidReading(String),

    /// Structural failure in the network or broker link.
    #[error("Transport error: {0}")]
    Transport(String),
}

//! Tracing infrastructure.
//!
//! Structured logging built on `tracing` and `tracing-subscriber`:
//! - Multiple output formats (pretty, compact, JSON)
//! - Environment-based filtering via `RUST_LOG`
//! - Level taken from the node configuration by default
//!
//! # Example
//! ```no_run
//! use vibenode::{config::NodeConfig, trace};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NodeConfig::load()?;
//! trace::init_from_config(&config)?;
//! tracing::info!("node started");
//! # Ok(())
//! # }
//! ```

use crate::config::NodeConfig;
use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Output format for tracing.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Pretty-printed format with colors (for development).
    Pretty,
    /// Compact format without colors (for production).
    Compact,
    /// JSON format for log aggregation.
    Json,
}

/// Tracing configuration options.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Level,
    /// Output format.
    pub format: OutputFormat,
    /// Whether to include file and line numbers.
    pub with_file_and_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::Compact,
            with_file_and_line: false,
        }
    }
}

impl TracingConfig {
    /// Create tracing config with a custom level.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Set output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// Initialize tracing from the node configuration.
pub fn init_from_config(config: &NodeConfig) -> Result<(), String> {
    let level = parse_log_level(&config.node.log_level)?;
    init(TracingConfig::new(level))
}

/// Initialize tracing with custom configuration.
///
/// Idempotent: if a global subscriber is already installed this returns
/// `Ok(())`, which makes it safe to call from tests.
pub fn init(config: TracingConfig) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string().to_lowercase()));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        OutputFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .boxed(),
        OutputFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(false)
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .boxed(),
        OutputFormat::Json => fmt::layer()
            .json()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()
        .or_else(|e| {
            // Already-initialized is expected when tests share a process
            if e.to_string()
                .contains("a global default trace dispatcher has already been set")
            {
                Ok(())
            } else {
                Err(format!("Failed to initialize tracing: {}", e))
            }
        })
}

/// Parse a log level string into a tracing `Level`.
pub fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!(
            "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        )),
    }
}

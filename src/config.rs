//! Configuration loading for the telemetry node.
//!
//! Configuration is strongly typed and loaded from two layered sources:
//! 1. A TOML file (`config/config.toml` by default)
//! 2. Environment variables prefixed with `VIBENODE_`
//!
//! Durations are written in human-friendly form (`"5s"`, `"500ms"`) via
//! `humantime_serde`. After extraction the configuration goes through a
//! `validate()` pass that catches values which parse fine but are logically
//! wrong (non-power-of-two sample counts, unknown log levels, and so on).
//!
//! # Example
//! ```no_run
//! use vibenode::config::NodeConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NodeConfig::load()?;
//! println!("device: {}", config.node.device_id);
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node identity and logging.
    pub node: NodeSection,
    /// Wireless network credentials.
    pub network: NetworkSection,
    /// Broker endpoint.
    pub broker: BrokerSection,
    /// Sample-capture parameters.
    #[serde(default)]
    pub acquisition: AcquisitionSection,
    /// Outbound rate limiting.
    #[serde(default)]
    pub publish: PublishSection,
    /// Reconnect retry behavior.
    #[serde(default)]
    pub connectivity: ConnectivitySection,
}

/// Node identity and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    /// Device identifier; doubles as broker client id and topic prefix.
    pub device_id: String,
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Pause between cycles after a publish attempt.
    #[serde(with = "humantime_serde", default = "default_cycle_pause")]
    pub cycle_pause: Duration,
}

/// Wireless network credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSection {
    /// Network name to associate with.
    pub ssid: String,
    /// Network passphrase.
    pub password: String,
}

/// Broker endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerSection {
    /// Broker hostname or address.
    pub host: String,
    /// Broker port.
    #[serde(default = "default_broker_port")]
    pub port: u16,
}

/// Sample-capture parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionSection {
    /// Samples per capture window. Must be a power of two.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    /// Target sampling rate in Hz. The realized rate is measured per window.
    #[serde(default = "default_target_rate")]
    pub target_rate_hz: f64,
}

/// Outbound rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSection {
    /// Minimum interval between accepted metric batches.
    #[serde(with = "humantime_serde", default = "default_min_interval")]
    pub min_interval: Duration,
}

/// Reconnect retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivitySection {
    /// Delay between network association attempts.
    #[serde(with = "humantime_serde", default = "default_network_retry_delay")]
    pub network_retry_delay: Duration,
    /// Delay between broker connection attempts.
    #[serde(with = "humantime_serde", default = "default_broker_retry_delay")]
    pub broker_retry_delay: Duration,
    /// Optional cap on total retry attempts per readiness check.
    /// `None` retries indefinitely.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for AcquisitionSection {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
            target_rate_hz: default_target_rate(),
        }
    }
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            min_interval: default_min_interval(),
        }
    }
}

impl Default for ConnectivitySection {
    fn default() -> Self {
        Self {
            network_retry_delay: default_network_retry_delay(),
            broker_retry_delay: default_broker_retry_delay(),
            max_attempts: None,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_cycle_pause() -> Duration {
    Duration::from_secs(1)
}

fn default_broker_port() -> u16 {
    1883
}

fn default_sample_count() -> usize {
    128
}

fn default_target_rate() -> f64 {
    1000.0
}

fn default_min_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_network_retry_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_broker_retry_delay() -> Duration {
    Duration::from_secs(5)
}

impl NodeConfig {
    /// Load configuration from `config/config.toml` and environment variables.
    ///
    /// Environment variables can override configuration with prefix `VIBENODE_`.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("config/config.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VIBENODE_").split("_"))
            .extract()
    }

    /// Load configuration from an in-memory TOML string. Used by tests.
    pub fn from_toml(toml: &str) -> Result<Self, figment::Error> {
        Figment::new().merge(Toml::string(toml)).extract()
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.node.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.node.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.node.device_id.is_empty() {
            return Err("device_id must not be empty".to_string());
        }

        if self.network.ssid.is_empty() {
            return Err("network ssid must not be empty".to_string());
        }

        let n = self.acquisition.sample_count;
        if n < 2 || !n.is_power_of_two() {
            return Err(format!(
                "Invalid sample_count {}. Must be a power of two >= 2",
                n
            ));
        }

        if self.acquisition.target_rate_hz <= 0.0 {
            return Err(format!(
                "Invalid target_rate_hz {}. Must be positive",
                self.acquisition.target_rate_hz
            ));
        }

        Ok(())
    }

    /// Nominal pause between sensor pulls, derived from the target rate.
    pub fn inter_sample_pause(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.acquisition.target_rate_hz)
    }
}

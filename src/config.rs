//! Configuration module
//!
//! This module handles all configuration types and loading
//! for the event bridge.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{net, polling, sampling};
use crate::types::Port;

/// Default TCP listen port, checked non-zero at compile time
fn default_listen_port() -> Port {
    const PORT: Port = match Port::new(net::LISTEN_PORT) {
        Some(port) => port,
        None => panic!("default listen port must be non-zero"),
    };
    PORT
}

/// Default metrics endpoint port, checked non-zero at compile time
fn default_metrics_port() -> Port {
    const PORT: Port = match Port::new(net::METRICS_PORT) {
        Some(port) => port,
        None => panic!("default metrics port must be non-zero"),
    };
    PORT
}

/// Default listen host (all local addresses)
fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

/// Default accept/read poll interval in milliseconds
fn default_poll_interval_ms() -> u64 {
    polling::INTERVAL.as_millis() as u64
}

/// Default per-connection sampling period
fn default_sample_period() -> u32 {
    sampling::PERIOD
}

/// Main bridge configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Downstream output destinations (`host:port`)
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Listener configuration
    #[serde(default)]
    pub listen: ListenConfig,
    /// Metrics endpoint configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Polling and sampling tuning
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenConfig {
    /// Host to bind
    #[serde(default = "default_listen_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_listen_port")]
    pub port: Port,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_listen_host(),
            port: default_listen_port(),
        }
    }
}

/// Metrics endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsConfig {
    /// Port for the HTTP metrics endpoint
    #[serde(default = "default_metrics_port")]
    pub port: Port,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

/// Polling and sampling tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Bounded wait for accept and read attempts in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Sample latency on every Nth message per connection
    #[serde(default = "default_sample_period")]
    pub sample_period: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            sample_period: default_sample_period(),
        }
    }
}

impl BridgeConfig {
    /// Poll interval as a [`Duration`]
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Validate configuration for correctness
    ///
    /// Checks for:
    /// - At least one output destination
    /// - No empty output destinations
    /// - Non-zero poll interval and sample period
    pub fn validate(&self) -> Result<()> {
        if self.outputs.is_empty() {
            return Err(anyhow::anyhow!(
                "No outputs defined. You need to define at least one"
            ));
        }
        for output in &self.outputs {
            if output.trim().is_empty() {
                return Err(anyhow::anyhow!("Output destination cannot be empty"));
            }
        }
        if self.bridge.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("bridge.poll_interval_ms must be > 0"));
        }
        if self.bridge.sample_period == 0 {
            return Err(anyhow::anyhow!("bridge.sample_period must be > 0"));
        }
        Ok(())
    }
}

/// Load output destinations from environment variables
///
/// Supports indexed environment variables for container deployments:
/// `BRIDGE_OUTPUT_0`, `BRIDGE_OUTPUT_1`, ...
///
/// If any `BRIDGE_OUTPUT_N` is found, environment variables take precedence
/// over config file outputs.
fn load_outputs_from_env() -> Option<Vec<String>> {
    let mut outputs = Vec::new();
    let mut index = 0;

    loop {
        match std::env::var(format!("BRIDGE_OUTPUT_{}", index)) {
            Ok(output) => outputs.push(output),
            Err(_) => break,
        }
        index += 1;
    }

    if outputs.is_empty() { None } else { Some(outputs) }
}

/// Load configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &str) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path))?;
    let mut config: Config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file '{}'", path))?;

    if let Some(outputs) = load_outputs_from_env() {
        config.outputs = outputs;
    }
    Ok(config)
}

/// Load configuration, falling back to defaults when the file is absent
///
/// Environment outputs still apply to the default configuration.
///
/// # Errors
/// Returns an error if an existing file cannot be read or parsed.
pub fn load_config_with_fallback(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        load_config(path)
    } else {
        let mut config = Config::default();
        if let Some(outputs) = load_outputs_from_env() {
            config.outputs = outputs;
        }
        Ok(config)
    }
}

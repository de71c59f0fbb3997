//! Command-line argument parsing for the bridge binary

use clap::Parser;

use crate::config::Config;
use crate::types::{Port, ThreadCount};

/// TCP-to-queue bridge for newline-delimited JSON sensor events
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Output destinations (host:port), overriding the config file
    pub outputs: Vec<String>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "TCP_PORT")]
    pub port: Option<Port>,

    /// Host to bind to (overrides config file)
    #[arg(long, env)]
    pub host: Option<String>,

    /// Port for the HTTP metrics endpoint (overrides config file)
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<Port>,

    /// Configuration file path
    #[arg(short, long, default_value = "bridge.toml", env)]
    pub config: String,

    /// Number of worker threads (default: 1)
    #[arg(short, long, env)]
    pub threads: Option<ThreadCount>,
}

impl Args {
    /// Get formatted listen address, CLI flags taking precedence
    #[must_use]
    pub fn listen_addr(&self, config: &Config) -> String {
        let host = self.host.as_deref().unwrap_or(&config.listen.host);
        let port = self.port.unwrap_or(config.listen.port);
        format!("{}:{}", host, port)
    }

    /// Get effective metrics port
    #[must_use]
    pub fn effective_metrics_port(&self, config: &Config) -> Port {
        self.metrics_port.unwrap_or(config.metrics.port)
    }

    /// Get effective output destinations, CLI arguments taking precedence
    #[must_use]
    pub fn effective_outputs(&self, config: &Config) -> Vec<String> {
        if self.outputs.is_empty() {
            config.outputs.clone()
        } else {
            self.outputs.clone()
        }
    }
}

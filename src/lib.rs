//! TCP-to-queue bridge for newline-delimited JSON sensor events
//!
//! The bridge sits between a network sensor emitting newline-delimited JSON
//! events over TCP and a queueing backend with no native support for that
//! wire protocol. Every received message is forwarded verbatim to the
//! configured downstream outputs; every 10th message per connection is
//! sampled for end-to-end latency, exported over a Prometheus `/metrics`
//! endpoint.
//!
//! Shutdown is cooperative: accept and read loops wait at most one poll
//! interval before re-checking the shared stop flag, and a stop request
//! blocks until the acceptor and every connection task have exited.

pub mod args;
pub mod bridge;
pub mod config;
pub mod connection;
pub mod constants;
pub mod latency;
pub mod logging;
pub mod metrics;
pub mod runtime;
pub mod shutdown;
pub mod sink;
pub mod types;

pub use bridge::{Bridge, BridgeBuilder};
pub use config::{Config, load_config, load_config_with_fallback};
pub use latency::LatencySampler;
pub use metrics::{BridgeMetrics, LatencyObserver, spawn_metrics_server};
pub use shutdown::{ShutdownController, ShutdownHandle};
pub use sink::{QueueSink, Sink, SinkError};

//! Constants used throughout the event bridge
//!
//! This module centralizes magic numbers and protocol values
//! to improve maintainability and reduce duplication.

use std::time::Duration;

/// Listener and connection polling
pub mod polling {
    use super::Duration;

    /// Bounded wait applied to every accept and read attempt.
    ///
    /// Neither accept nor read may block longer than this, so a stop request
    /// is observed by every task within one interval. Matches the reference
    /// deployment's one-second deadline.
    pub const INTERVAL: Duration = Duration::from_secs(1);
}

/// Latency sampling configuration
pub mod sampling {
    /// Sample every Nth message per connection.
    ///
    /// The counter is per-connection; with many connections each contributes
    /// its own 1-in-10 samples.
    pub const PERIOD: u32 = 10;

    /// Latency above this value is logged at warning level (1 second).
    pub const WARN_THRESHOLD_NANOS: i64 = 1_000_000_000;
}

/// Network defaults
pub mod net {
    /// Default TCP listen port (0xBEEF).
    pub const LISTEN_PORT: u16 = 48879;

    /// Default HTTP port for the metrics endpoint.
    pub const METRICS_PORT: u16 = 8080;
}

/// Message forwarding
pub mod forwarding {
    /// Logical output name every forwarded message is published under.
    pub const OUTPUT_NAME: &str = "output";

    /// Depth of each destination writer's queue before senders are
    /// backpressured.
    pub const QUEUE_DEPTH: usize = 1024;
}

/// Metrics naming
pub mod metrics {
    /// Name of the end-to-end latency histogram.
    pub const LATENCY_METRIC: &str = "event_latency";

    /// Label key identifying the sampling source.
    pub const SOURCE_LABEL: &str = "source";

    /// Fixed label value for samples recorded by this bridge.
    pub const SOURCE_VALUE: &str = "bridge";
}

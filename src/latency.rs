//! End-to-end latency sampling
//!
//! Every sampled message is parsed down to the two fields the measurement
//! needs: an identifier and an RFC3339 origin timestamp. Sampling is
//! best-effort and never surfaces an error to the forwarding path; a
//! malformed message costs at most one dropped or inaccurate sample.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::constants::sampling::WARN_THRESHOLD_NANOS;
use crate::metrics::LatencyObserver;

/// Minimal projection of a sensor event
///
/// Fields default to empty when absent; an event without a `time` field is
/// treated the same as one whose timestamp fails to parse.
#[derive(Debug, Deserialize)]
struct Event {
    #[serde(default)]
    id: String,
    #[serde(default)]
    time: String,
}

/// Measures sensor-to-bridge latency for sampled messages
#[derive(Clone)]
pub struct LatencySampler {
    observer: Arc<dyn LatencyObserver>,
}

impl LatencySampler {
    /// Create a sampler reporting to the given observer
    #[must_use]
    pub fn new(observer: Arc<dyn LatencyObserver>) -> Self {
        Self { observer }
    }

    /// Nanoseconds since the Unix epoch, for receipt timestamps
    #[must_use]
    pub fn now_nanos() -> i64 {
        Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }

    /// Record one latency sample from a raw message
    ///
    /// Best-effort: a message that is not a JSON event produces no sample;
    /// a parseable event with an unparseable timestamp is measured against
    /// the epoch, which records a uselessly large latency rather than none.
    pub fn sample(&self, raw: &Bytes, received_nanos: i64) {
        let event: Event = match serde_json::from_slice(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!("Unable to log latency, couldn't parse event: {}", e);
                return;
            }
        };

        let event_nanos = match DateTime::parse_from_rfc3339(&event.time) {
            Ok(time) => time.timestamp_nanos_opt().unwrap_or(0),
            Err(e) => {
                warn!("Event time parse error: {}", e);
                0
            }
        };

        let latency = received_nanos - event_nanos;
        if latency > WARN_THRESHOLD_NANOS {
            warn!(
                "Latency of {} ms for event id: {}",
                latency / 1_000_000,
                event.id
            );
        }
        self.observer.observe_latency(latency as f64);
    }
}

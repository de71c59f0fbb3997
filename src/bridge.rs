//! Acceptor loop and bridge assembly
//!
//! The [`Bridge`] owns everything shared across connections: the sink, the
//! latency sampler, and the metrics instruments. [`Bridge::serve`] runs the
//! accept loop until the stop signal is observed, spawning one
//! [`ConnectionHandler`](crate::connection::ConnectionHandler) task per
//! accepted connection.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{error, info};

use crate::connection::ConnectionHandler;
use crate::constants::{polling, sampling};
use crate::latency::LatencySampler;
use crate::metrics::{BridgeMetrics, LatencyObserver};
use crate::shutdown::ShutdownHandle;
use crate::sink::Sink;

/// Builder for a [`Bridge`] with optional overrides
///
/// Defaults: one-second poll interval, 1-in-10 sampling, latency samples
/// reported to the bridge's own metrics.
pub struct BridgeBuilder {
    sink: Arc<dyn Sink>,
    metrics: Arc<BridgeMetrics>,
    observer: Option<Arc<dyn LatencyObserver>>,
    poll_interval: Duration,
    sample_period: u32,
}

impl BridgeBuilder {
    /// Create a builder with default polling and sampling
    #[must_use]
    pub fn new(sink: Arc<dyn Sink>, metrics: Arc<BridgeMetrics>) -> Self {
        Self {
            sink,
            metrics,
            observer: None,
            poll_interval: polling::INTERVAL,
            sample_period: sampling::PERIOD,
        }
    }

    /// Override the accept/read poll interval
    ///
    /// This bounds how long any task can take to observe a stop request.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the per-connection sampling period
    #[must_use]
    pub fn with_sample_period(mut self, period: u32) -> Self {
        self.sample_period = period;
        self
    }

    /// Report latency samples somewhere other than the bridge metrics
    #[must_use]
    pub fn with_latency_observer(mut self, observer: Arc<dyn LatencyObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the bridge
    ///
    /// # Errors
    /// Returns an error if the sample period is zero.
    pub fn build(self) -> Result<Bridge> {
        if self.sample_period == 0 {
            anyhow::bail!("Sample period must be non-zero");
        }
        let observer = self
            .observer
            .unwrap_or_else(|| Arc::clone(&self.metrics) as Arc<dyn LatencyObserver>);

        Ok(Bridge {
            sink: self.sink,
            sampler: LatencySampler::new(observer),
            metrics: self.metrics,
            poll_interval: self.poll_interval,
            sample_period: self.sample_period,
        })
    }
}

/// Accepts sensor connections and fans their events out to the sink
#[derive(Clone)]
pub struct Bridge {
    sink: Arc<dyn Sink>,
    sampler: LatencySampler,
    metrics: Arc<BridgeMetrics>,
    poll_interval: Duration,
    sample_period: u32,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("poll_interval", &self.poll_interval)
            .field("sample_period", &self.sample_period)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Create a bridge with default polling and sampling
    ///
    /// # Errors
    /// Returns an error if the builder rejects the configuration.
    pub fn new(sink: Arc<dyn Sink>, metrics: Arc<BridgeMetrics>) -> Result<Self> {
        BridgeBuilder::new(sink, metrics).build()
    }

    /// Create a builder for fine-grained control
    #[must_use]
    pub fn builder(sink: Arc<dyn Sink>, metrics: Arc<BridgeMetrics>) -> BridgeBuilder {
        BridgeBuilder::new(sink, metrics)
    }

    /// Accept connections until the stop signal is observed
    ///
    /// Each accept waits at most one poll interval before re-checking the
    /// stop flag; blocking-accept cannot be interrupted on demand, so the
    /// bounded wait is the cancellation mechanism. The listener is closed
    /// when this returns. New connection tasks register with the shutdown
    /// coordinator through a clone of this task's own handle.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownHandle) {
        let local_addr = listener.local_addr().ok();

        loop {
            if shutdown.is_stopped() {
                match local_addr {
                    Some(addr) => info!("Stopping listener on: {}", addr),
                    None => info!("Stopping listener"),
                }
                break;
            }

            match timeout(self.poll_interval, listener.accept()).await {
                // Poll checkpoint; nothing was accepted.
                Err(_elapsed) => continue,
                Ok(Ok((stream, peer))) => {
                    info!("Connected to address: {}", peer);
                    self.metrics.record_connection_opened();

                    let handler = ConnectionHandler::new(
                        peer,
                        shutdown.clone(),
                        Arc::clone(&self.sink),
                        self.sampler.clone(),
                        Arc::clone(&self.metrics),
                        self.poll_interval,
                        self.sample_period,
                    );
                    tokio::spawn(handler.handle(stream));
                }
                Ok(Err(e)) => {
                    // Deliberately permissive: retried like a timeout, which
                    // can spin hot under a persistent listener error.
                    error!("Failed to accept TCP connection: {}", e);
                }
            }
        }
        // Listener drops here; no in-flight accepts exist by construction.
    }
}

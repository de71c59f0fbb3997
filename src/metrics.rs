//! Bridge metrics and HTTP exposition
//!
//! [`BridgeMetrics`] owns every instrument the bridge records into, backed by
//! a shared Prometheus [`Registry`]. All instruments are safe to update
//! concurrently from any number of connection tasks.
//!
//! The latency sampler depends only on the [`LatencyObserver`] capability, so
//! tests can substitute a recording fake without touching the registry.

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::constants::metrics::{LATENCY_METRIC, SOURCE_LABEL, SOURCE_VALUE};

/// Capability to record one end-to-end latency sample
pub trait LatencyObserver: Send + Sync {
    /// Record a latency value in nanoseconds
    fn observe_latency(&self, nanos: f64);
}

/// All instruments exported by the bridge
#[derive(Clone)]
pub struct BridgeMetrics {
    registry: Registry,
    event_latency: HistogramVec,
    events_forwarded: IntCounter,
    connections_total: IntCounter,
    active_connections: IntGauge,
}

impl BridgeMetrics {
    /// Create and register every instrument on a fresh registry
    ///
    /// The latency series is seeded with a zero observation so the metric
    /// exists before any real sample arrives.
    ///
    /// # Errors
    /// Returns an error if an instrument cannot be created or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        // Nanosecond-valued buckets from 1ms to ~17min.
        let buckets = prometheus::exponential_buckets(1e6, 10.0, 7)
            .context("invalid latency bucket configuration")?;
        let event_latency = HistogramVec::new(
            HistogramOpts::new(LATENCY_METRIC, "Latency from sensor to bridge in nanoseconds")
                .buckets(buckets),
            &[SOURCE_LABEL],
        )?;
        let events_forwarded = IntCounter::new(
            "events_forwarded_total",
            "Messages forwarded to the sink across all connections",
        )?;
        let connections_total =
            IntCounter::new("connections_total", "TCP connections accepted since start")?;
        let active_connections =
            IntGauge::new("active_connections", "Currently open TCP connections")?;

        registry
            .register(Box::new(event_latency.clone()))
            .context("failed to register latency histogram")?;
        registry
            .register(Box::new(events_forwarded.clone()))
            .context("failed to register forwarded counter")?;
        registry
            .register(Box::new(connections_total.clone()))
            .context("failed to register connection counter")?;
        registry
            .register(Box::new(active_connections.clone()))
            .context("failed to register connection gauge")?;

        let metrics = Self {
            registry,
            event_latency,
            events_forwarded,
            connections_total,
            active_connections,
        };
        metrics.observe_latency(0.0);
        Ok(metrics)
    }

    /// Count one forwarded message
    pub fn record_forwarded(&self) {
        self.events_forwarded.inc();
    }

    /// Count one accepted connection
    pub fn record_connection_opened(&self) {
        self.connections_total.inc();
        self.active_connections.inc();
    }

    /// Mark one connection as closed
    pub fn record_connection_closed(&self) {
        self.active_connections.dec();
    }

    /// Render the registry in Prometheus text exposition format
    #[must_use]
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl LatencyObserver for BridgeMetrics {
    fn observe_latency(&self, nanos: f64) {
        self.event_latency
            .with_label_values(&[SOURCE_VALUE])
            .observe(nanos);
    }
}

/// Bind the metrics endpoint and serve `GET /metrics` in the background
///
/// # Errors
/// Returns an error if the metrics port cannot be bound.
pub async fn spawn_metrics_server(port: u16, metrics: Arc<BridgeMetrics>) -> Result<()> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let metrics = Arc::clone(&metrics);
            async move { metrics.render() }
        }),
    );

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind metrics endpoint on {}", addr))?;
    info!("Serving metrics on {}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server exited: {}", e);
        }
    });

    Ok(())
}

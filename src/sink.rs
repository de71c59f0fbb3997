//! Downstream message sinks
//!
//! A [`Sink`] is the capability the bridge forwards into: a logical output
//! name plus a payload. Implementations own delivery, queuing, and
//! backpressure; the forwarding path never retries and never surfaces
//! delivery failures to the TCP peer.
//!
//! All sinks must be safe for concurrent use from arbitrarily many
//! connection tasks simultaneously.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::constants::forwarding::QUEUE_DEPTH;

/// Errors surfaced by sink implementations
#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("no output destinations configured")]
    NoDestinations,

    #[error("unknown output '{0}'")]
    UnknownOutput(String),

    #[error("output '{0}' is closed")]
    Closed(String),

    #[error("failed to connect to destination '{0}': {1}")]
    ConnectionFailed(String, String),
}

/// A destination set for forwarded messages
#[async_trait]
pub trait Sink: Send + Sync {
    /// Publish a payload under a logical output name
    async fn send(&self, output: &str, payload: Bytes) -> Result<(), SinkError>;
}

/// Sink that feeds each configured queue-ingest destination over TCP
///
/// One writer task per destination, fed by a bounded channel; the logical
/// output name `"output"` fans out to every destination. Destinations are
/// connected eagerly, so a bad destination fails startup instead of
/// surfacing later on the forwarding path. There is no reconnect: a writer
/// that loses its connection logs the failure and stops draining.
pub struct QueueSink {
    routes: HashMap<String, Vec<usize>>,
    destinations: Vec<Destination>,
}

struct Destination {
    addr: String,
    queue: mpsc::Sender<Bytes>,
}

impl QueueSink {
    /// Connect to every destination and route `"output"` to all of them
    ///
    /// # Errors
    /// Returns an error if the destination list is empty or any destination
    /// cannot be connected.
    pub async fn connect(destinations: &[String]) -> Result<Self, SinkError> {
        if destinations.is_empty() {
            return Err(SinkError::NoDestinations);
        }

        let mut connected = Vec::with_capacity(destinations.len());
        for addr in destinations {
            let stream = TcpStream::connect(addr)
                .await
                .map_err(|e| SinkError::ConnectionFailed(addr.clone(), e.to_string()))?;
            info!("Connected to output destination {}", addr);

            let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
            tokio::spawn(drain_to_destination(addr.clone(), stream, rx));
            connected.push(Destination {
                addr: addr.clone(),
                queue: tx,
            });
        }

        let routes = HashMap::from([(
            crate::constants::forwarding::OUTPUT_NAME.to_string(),
            (0..connected.len()).collect(),
        )]);

        Ok(Self {
            routes,
            destinations: connected,
        })
    }
}

#[async_trait]
impl Sink for QueueSink {
    async fn send(&self, output: &str, payload: Bytes) -> Result<(), SinkError> {
        let indices = self
            .routes
            .get(output)
            .ok_or_else(|| SinkError::UnknownOutput(output.to_string()))?;

        for &idx in indices {
            let destination = &self.destinations[idx];
            if destination.queue.send(payload.clone()).await.is_err() {
                return Err(SinkError::Closed(destination.addr.clone()));
            }
        }
        Ok(())
    }
}

/// Writer task: drains a destination's queue onto its TCP stream
async fn drain_to_destination(addr: String, mut stream: TcpStream, mut rx: mpsc::Receiver<Bytes>) {
    while let Some(payload) = rx.recv().await {
        if let Err(e) = stream.write_all(&payload).await {
            warn!("Destination {} write failed, dropping output: {}", addr, e);
            return;
        }
    }
    info!("Destination {} queue closed", addr);
}

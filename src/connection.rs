//! Per-connection read/dispatch loop
//!
//! Each accepted connection is owned by exactly one [`ConnectionHandler`]
//! task for its lifetime. The handler reads newline-delimited messages,
//! forwards each verbatim to the sink, and hands every Nth message to the
//! latency sampler. A connection failure never affects other connections or
//! the acceptor.

use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::constants::forwarding::OUTPUT_NAME;
use crate::latency::LatencySampler;
use crate::metrics::BridgeMetrics;
use crate::shutdown::ShutdownHandle;
use crate::sink::Sink;

/// Handles one accepted connection until stop or disconnect
pub struct ConnectionHandler {
    peer: SocketAddr,
    shutdown: ShutdownHandle,
    sink: Arc<dyn Sink>,
    sampler: LatencySampler,
    metrics: Arc<BridgeMetrics>,
    poll_interval: Duration,
    sample_period: u32,
}

impl ConnectionHandler {
    pub(crate) fn new(
        peer: SocketAddr,
        shutdown: ShutdownHandle,
        sink: Arc<dyn Sink>,
        sampler: LatencySampler,
        metrics: Arc<BridgeMetrics>,
        poll_interval: Duration,
        sample_period: u32,
    ) -> Self {
        Self {
            peer,
            shutdown,
            sink,
            sampler,
            metrics,
            poll_interval,
            sample_period,
        }
    }

    /// Read newline-delimited messages and forward each until the stop
    /// signal is observed or the connection becomes unusable
    ///
    /// The connection is closed when this returns, for any reason.
    pub(crate) async fn handle(self, stream: TcpStream) {
        let mut reader = BufReader::new(stream);
        // Message buffer outlives each bounded read so a poll timeout never
        // drops a partially received message.
        let mut buf: Vec<u8> = Vec::new();
        let mut sample_count: u32 = 0;

        loop {
            if self.shutdown.is_stopped() {
                info!("Disconnecting from {}", self.peer);
                break;
            }

            match timeout(self.poll_interval, reader.read_until(b'\n', &mut buf)).await {
                // Cancellation checkpoint, not an error.
                Err(_elapsed) => continue,
                Ok(Err(e)) => {
                    warn!("Unable to read from connection {}: {}", self.peer, e);
                    break;
                }
                Ok(Ok(0)) => {
                    self.log_disconnect(&buf);
                    break;
                }
                Ok(Ok(_)) => {
                    let received_nanos = LatencySampler::now_nanos();
                    if buf.last() != Some(&b'\n') {
                        // read_until only stops short of the delimiter at EOF.
                        self.log_disconnect(&buf);
                        break;
                    }
                    let msg = Bytes::from(std::mem::take(&mut buf));

                    sample_count += 1;
                    if sample_count == self.sample_period {
                        let sampler = self.sampler.clone();
                        let sample_msg = msg.clone();
                        tokio::spawn(async move {
                            sampler.sample(&sample_msg, received_nanos);
                        });
                        sample_count = 0;
                    }

                    match self.sink.send(OUTPUT_NAME, msg).await {
                        Ok(()) => self.metrics.record_forwarded(),
                        Err(e) => warn!("Sink send failed for {}: {}", self.peer, e),
                    }
                }
            }
        }

        self.metrics.record_connection_closed();
    }

    fn log_disconnect(&self, buf: &[u8]) {
        if !buf.is_empty() {
            debug!(
                "Discarding {} unterminated bytes from {}",
                buf.len(),
                self.peer
            );
        }
        warn!("Connection closed by {}", self.peer);
    }
}

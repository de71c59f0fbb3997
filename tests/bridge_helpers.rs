//! Shared helpers for bridge integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use event_bridge::{
    Bridge, BridgeMetrics, LatencyObserver, ShutdownController, Sink, SinkError,
};

/// Sink that records every (output, payload) pair in receipt order
#[derive(Default)]
pub struct CapturingSink {
    sent: Mutex<Vec<(String, Bytes)>>,
}

impl CapturingSink {
    pub fn sent(&self) -> Vec<(String, Bytes)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| payload.to_vec())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Sink for CapturingSink {
    async fn send(&self, output: &str, payload: Bytes) -> Result<(), SinkError> {
        self.sent.lock().unwrap().push((output.to_string(), payload));
        Ok(())
    }
}

/// Latency observer that records every reported value
#[derive(Default)]
pub struct RecordingObserver {
    samples: Mutex<Vec<f64>>,
}

impl RecordingObserver {
    pub fn samples(&self) -> Vec<f64> {
        self.samples.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }
}

impl LatencyObserver for RecordingObserver {
    fn observe_latency(&self, nanos: f64) {
        self.samples.lock().unwrap().push(nanos);
    }
}

/// A bridge serving on an ephemeral port, wired to capturing test doubles
pub struct TestBridge {
    pub addr: SocketAddr,
    pub sink: Arc<CapturingSink>,
    pub observer: Arc<RecordingObserver>,
    pub controller: ShutdownController,
    pub serve_task: JoinHandle<()>,
}

/// Start a bridge with a short poll interval suitable for tests
pub async fn start_bridge(poll: Duration, sample_period: u32) -> TestBridge {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let sink = Arc::new(CapturingSink::default());
    let observer = Arc::new(RecordingObserver::default());
    let metrics = Arc::new(BridgeMetrics::new().unwrap());

    let bridge = Bridge::builder(sink.clone() as Arc<dyn Sink>, metrics)
        .with_poll_interval(poll)
        .with_sample_period(sample_period)
        .with_latency_observer(observer.clone())
        .build()
        .unwrap();

    let controller = ShutdownController::new();
    let serve_task = tokio::spawn(bridge.serve(listener, controller.register()));

    TestBridge {
        addr,
        sink,
        observer,
        controller,
        serve_task,
    }
}

/// Poll a condition until it holds or the deadline passes
pub async fn wait_until<F: Fn() -> bool>(cond: F, deadline: Duration) -> bool {
    let end = tokio::time::Instant::now() + deadline;
    while tokio::time::Instant::now() < end {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// A newline-terminated JSON event line
pub fn event_line(id: &str, time: &str) -> Vec<u8> {
    format!(r#"{{"id":"{}","time":"{}"}}"#, id, time)
        .into_bytes()
        .into_iter()
        .chain(std::iter::once(b'\n'))
        .collect()
}

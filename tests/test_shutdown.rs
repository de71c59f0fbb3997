//! Graceful shutdown: a stop request blocks until the acceptor and every
//! connection task have exited, and no new connection is accepted after it.

use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

mod bridge_helpers;
use bridge_helpers::*;

const POLL: Duration = Duration::from_millis(50);

#[tokio::test]
async fn test_shutdown_with_active_connections() {
    let bridge = start_bridge(POLL, 10).await;

    // Three live connections, all kept open across the stop request.
    let mut clients = Vec::new();
    for i in 0..3 {
        let mut client = TcpStream::connect(bridge.addr).await.unwrap();
        client
            .write_all(&event_line(&format!("c{}", i), "2026-08-06T00:00:00Z"))
            .await
            .unwrap();
        clients.push(client);
    }
    assert!(wait_until(|| bridge.sink.count() == 3, Duration::from_secs(2)).await);

    // Stop must wait for the acceptor plus all three handlers, each of
    // which notices the flag within one poll interval.
    timeout(Duration::from_secs(2), bridge.controller.shutdown())
        .await
        .expect("shutdown should complete within a few poll intervals");
    bridge.serve_task.await.unwrap();

    // The listener is closed; nothing new is accepted.
    assert!(
        TcpStream::connect(bridge.addr).await.is_err(),
        "listener should be closed after shutdown"
    );
    drop(clients);
}

#[tokio::test]
async fn test_shutdown_with_no_connections() {
    let bridge = start_bridge(POLL, 10).await;

    timeout(Duration::from_secs(2), bridge.controller.shutdown())
        .await
        .expect("idle bridge should stop within a poll interval");
    bridge.serve_task.await.unwrap();
}

#[tokio::test]
async fn test_messages_before_stop_are_forwarded() {
    let bridge = start_bridge(POLL, 10).await;

    let mut client = TcpStream::connect(bridge.addr).await.unwrap();
    client
        .write_all(&event_line("pre-stop", "2026-08-06T00:00:00Z"))
        .await
        .unwrap();
    assert!(wait_until(|| bridge.sink.count() == 1, Duration::from_secs(2)).await);

    timeout(Duration::from_secs(2), bridge.controller.shutdown())
        .await
        .expect("shutdown should complete");

    // Nothing sent pre-stop was lost.
    assert_eq!(bridge.sink.count(), 1);
    drop(client);
}

#[tokio::test]
async fn test_shutdown_latency_bounded_by_poll_interval() {
    // Many idle connections; the wait is bounded by the poll interval, not
    // the connection count.
    let bridge = start_bridge(POLL, 10).await;

    let mut clients = Vec::new();
    for _ in 0..20 {
        clients.push(TcpStream::connect(bridge.addr).await.unwrap());
    }
    // Let the acceptor pick them all up.
    tokio::time::sleep(POLL * 3).await;

    let started = tokio::time::Instant::now();
    timeout(Duration::from_secs(2), bridge.controller.shutdown())
        .await
        .expect("shutdown should complete");
    let elapsed = started.elapsed();

    // Generous bound: a handful of poll intervals, nowhere near 20x.
    assert!(
        elapsed < POLL * 10,
        "shutdown took {:?} for 20 idle connections",
        elapsed
    );
    drop(clients);
}

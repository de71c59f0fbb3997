//! Forwarding fidelity: every terminated message reaches the sink verbatim,
//! in receipt order, and unterminated tails never do.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod bridge_helpers;
use bridge_helpers::*;

const POLL: Duration = Duration::from_millis(50);

#[tokio::test]
async fn test_messages_forwarded_in_order_and_verbatim() {
    let bridge = start_bridge(POLL, 10).await;
    let mut client = TcpStream::connect(bridge.addr).await.unwrap();

    let lines: Vec<Vec<u8>> = (0..5)
        .map(|i| event_line(&format!("ev-{}", i), "2026-08-06T00:00:00Z"))
        .collect();
    for line in &lines {
        client.write_all(line).await.unwrap();
    }
    drop(client);

    assert!(
        wait_until(|| bridge.sink.count() == 5, Duration::from_secs(2)).await,
        "expected 5 forwarded messages, got {}",
        bridge.sink.count()
    );

    let sent = bridge.sink.sent();
    for (i, (output, payload)) in sent.iter().enumerate() {
        assert_eq!(output, "output");
        // Byte-identical, trailing delimiter included.
        assert_eq!(&payload[..], &lines[i][..]);
    }
}

#[tokio::test]
async fn test_non_json_payloads_forwarded_untouched() {
    let bridge = start_bridge(POLL, 10).await;
    let mut client = TcpStream::connect(bridge.addr).await.unwrap();

    // Forwarding is content-agnostic; only the sampler cares about JSON.
    let payload = [0x00, 0xFF, b'{', 0x80, b'\n'];
    client.write_all(&payload).await.unwrap();
    drop(client);

    assert!(wait_until(|| bridge.sink.count() == 1, Duration::from_secs(2)).await);
    assert_eq!(bridge.sink.payloads()[0], payload.to_vec());
}

#[tokio::test]
async fn test_unterminated_tail_never_forwarded() {
    let bridge = start_bridge(POLL, 10).await;
    let mut client = TcpStream::connect(bridge.addr).await.unwrap();

    client.write_all(b"left unterminated").await.unwrap();
    drop(client);

    // Give the handler several poll intervals to (incorrectly) forward it.
    tokio::time::sleep(POLL * 4).await;
    assert_eq!(bridge.sink.count(), 0);
}

#[tokio::test]
async fn test_terminated_prefix_kept_unterminated_tail_dropped() {
    let bridge = start_bridge(POLL, 10).await;
    let mut client = TcpStream::connect(bridge.addr).await.unwrap();

    client.write_all(b"first\nsecond\ntail without end").await.unwrap();
    drop(client);

    assert!(wait_until(|| bridge.sink.count() == 2, Duration::from_secs(2)).await);
    tokio::time::sleep(POLL * 4).await;

    assert_eq!(
        bridge.sink.payloads(),
        vec![b"first\n".to_vec(), b"second\n".to_vec()]
    );
}

#[tokio::test]
async fn test_malformed_json_does_not_stall_forwarding() {
    // Sample every message so the malformed one definitely reaches the
    // sampler.
    let bridge = start_bridge(POLL, 1).await;
    let mut client = TcpStream::connect(bridge.addr).await.unwrap();

    client.write_all(b"!!not json!!\n").await.unwrap();
    client
        .write_all(&event_line("after-garbage", "2026-08-06T00:00:00Z"))
        .await
        .unwrap();
    drop(client);

    assert!(
        wait_until(|| bridge.sink.count() == 2, Duration::from_secs(2)).await,
        "both messages should be forwarded regardless of JSON validity"
    );
    // The malformed message produced no sample; the valid one produced one.
    assert!(wait_until(|| bridge.observer.count() == 1, Duration::from_secs(2)).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(bridge.observer.count(), 1);
}

#[tokio::test]
async fn test_slow_sender_message_survives_poll_timeouts() {
    let bridge = start_bridge(POLL, 10).await;
    let mut client = TcpStream::connect(bridge.addr).await.unwrap();

    client.write_all(b"spread ").await.unwrap();
    client.flush().await.unwrap();
    tokio::time::sleep(POLL * 3).await;
    client.write_all(b"over polls\n").await.unwrap();
    drop(client);

    assert!(wait_until(|| bridge.sink.count() == 1, Duration::from_secs(2)).await);
    assert_eq!(bridge.sink.payloads()[0], b"spread over polls\n".to_vec());
}

#[tokio::test]
async fn test_handler_closes_connection_on_exit() {
    let bridge = start_bridge(POLL, 10).await;
    let mut client = TcpStream::connect(bridge.addr).await.unwrap();

    client.write_all(b"one\n").await.unwrap();
    assert!(wait_until(|| bridge.sink.count() == 1, Duration::from_secs(2)).await);

    bridge.controller.shutdown().await;

    // Handler exit drops its stream; the client observes EOF.
    let mut buf = [0u8; 1];
    let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
        .await
        .expect("client should observe close promptly")
        .unwrap();
    assert_eq!(n, 0);
}

//! Integration tests for the live ingestion path, driven against an
//! in-process WebSocket broker stub.

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use miasma::config::FeedMode;
use miasma::ingest::{spawn_dispatcher, FeedClient, FeedConfig, FeedEvent};
use miasma::model::Severity;
use miasma::store::LiveStore;
use miasma::LocationKey;

fn feed_config(url: String, mode: FeedMode) -> FeedConfig {
    FeedConfig {
        url,
        mode,
        topic: "alerts".to_string(),
        qos: 0,
        client_id: "test-client".to_string(),
    }
}

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind broker");
    let addr = listener.local_addr().expect("local addr");
    (listener, addr)
}

/// Block until the store has applied at least `target` upserts
async fn wait_for_generation(store: &LiveStore, target: u64) {
    let mut rx = store.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while *rx.borrow_and_update() < target {
            rx.changed().await.expect("store dropped");
        }
    })
    .await
    .expect("timed out waiting for feed events");
}

#[tokio::test]
async fn pubsub_handshake_then_last_write_wins() {
    let (listener, addr) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");

        // First frame must be the subscribe request
        let frame = ws
            .next()
            .await
            .expect("subscribe frame")
            .expect("read")
            .into_text()
            .expect("text");
        let subscribe: serde_json::Value = serde_json::from_str(&frame).expect("json");
        assert_eq!(subscribe["action"], "subscribe");
        assert_eq!(subscribe["topic"], "alerts");
        assert_eq!(subscribe["qos"], 0);

        for payload in [
            json!({"lat": 10.0, "lon": 20.0, "pm25": 12.0}),
            json!({"lat": 5.0, "lon": 5.0, "pm25": 7.5}),
            json!({"lat": 10.0, "lon": 20.0, "pm25": 40.0, "severity": "alert"}),
        ] {
            ws.send(Message::Text(payload.to_string())).await.expect("send");
        }

        // Hold the connection open until the client closes it
        while let Some(msg) = ws.next().await {
            if msg.is_err() {
                break;
            }
        }
    });

    let store = Arc::new(LiveStore::new());
    let (feed, events) = FeedClient::spawn(feed_config(format!("ws://{}", addr), FeedMode::Pubsub));
    let dispatcher = spawn_dispatcher(Arc::clone(&store), events);

    wait_for_generation(&store, 3).await;

    // Two keys remain, and the duplicate key holds the last write
    assert_eq!(store.len(), 2);
    let point = store.get(&LocationKey::new(10.0, 20.0)).expect("point");
    assert_eq!(point.pm25, 40.0);
    assert_eq!(point.severity, Some(Severity::Alert));

    feed.shutdown().await;
    let _ = dispatcher.await;
    server.abort();
}

#[tokio::test]
async fn reconnect_resubscribes_after_disconnect() {
    let (listener, addr) = bind().await;

    let server = tokio::spawn(async move {
        // First connection: handshake, one frame, then drop the socket
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        let frame = ws
            .next()
            .await
            .expect("subscribe frame")
            .expect("read")
            .into_text()
            .expect("text");
        let subscribe: serde_json::Value = serde_json::from_str(&frame).expect("json");
        assert_eq!(subscribe["action"], "subscribe");
        ws.send(Message::Text(
            json!({"lat": 1.0, "lon": 1.0, "pm25": 5.0}).to_string(),
        ))
        .await
        .expect("send");
        ws.close(None).await.expect("close");
        drop(ws);

        // Second connection: the client must subscribe again before data
        let (stream, _) = listener.accept().await.expect("re-accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        let frame = ws
            .next()
            .await
            .expect("second subscribe frame")
            .expect("read")
            .into_text()
            .expect("text");
        let subscribe: serde_json::Value = serde_json::from_str(&frame).expect("json");
        assert_eq!(subscribe["action"], "subscribe");
        assert_eq!(subscribe["topic"], "alerts");
        ws.send(Message::Text(
            json!({"lat": 2.0, "lon": 2.0, "pm25": 9.0}).to_string(),
        ))
        .await
        .expect("send");

        while let Some(msg) = ws.next().await {
            if msg.is_err() {
                break;
            }
        }
    });

    let store = Arc::new(LiveStore::new());
    let (feed, events) = FeedClient::spawn(feed_config(format!("ws://{}", addr), FeedMode::Pubsub));
    let dispatcher = spawn_dispatcher(Arc::clone(&store), events);

    // Upserts from both sides of the disconnect are applied
    wait_for_generation(&store, 2).await;
    assert!(store.get(&LocationKey::new(1.0, 1.0)).is_some());
    assert!(store.get(&LocationKey::new(2.0, 2.0)).is_some());

    feed.shutdown().await;
    let _ = dispatcher.await;

    // The broker task ran both handshake assertions to completion
    tokio::time::timeout(Duration::from_secs(1), server)
        .await
        .expect("broker should exit after the close")
        .expect("broker assertions");
}

#[tokio::test]
async fn shutdown_interrupts_a_stalled_connect() {
    // Bound but never accepted: the TCP handshake lands in the backlog and
    // the WebSocket upgrade response never arrives, so the connect stalls
    let (listener, addr) = bind().await;
    let _listener = listener;

    let (feed, _events) =
        FeedClient::spawn(feed_config(format!("ws://{}", addr), FeedMode::Pubsub));

    // Give the connection task time to enter the connect attempt
    tokio::time::sleep(Duration::from_millis(100)).await;

    tokio::time::timeout(Duration::from_secs(1), feed.shutdown())
        .await
        .expect("shutdown should not wait out the connect attempt");
}

#[tokio::test]
async fn malformed_frame_does_not_stop_the_stream() {
    let (listener, addr) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        let _ = ws.next().await; // subscribe frame

        let frames = [
            json!({"lat": 1.0, "lon": 1.0, "pm25": 5.0}).to_string(),
            "{definitely not json".to_string(),
            json!({"lat": 2.0, "lon": 2.0, "pm25": 9.0}).to_string(),
        ];
        for frame in frames {
            ws.send(Message::Text(frame)).await.expect("send");
        }

        while let Some(msg) = ws.next().await {
            if msg.is_err() {
                break;
            }
        }
    });

    let store = Arc::new(LiveStore::new());
    let (feed, events) = FeedClient::spawn(feed_config(format!("ws://{}", addr), FeedMode::Pubsub));
    let dispatcher = spawn_dispatcher(Arc::clone(&store), events);

    wait_for_generation(&store, 2).await;

    // Both valid frames applied; the malformed one was dropped and counted
    assert_eq!(store.len(), 2);
    assert!(store.get(&LocationKey::new(2.0, 2.0)).is_some());
    assert_eq!(feed.decode_failures(), 1);

    feed.shutdown().await;
    let _ = dispatcher.await;
    server.abort();
}

#[tokio::test]
async fn legacy_endpoint_delivers_without_handshake() {
    let (listener, addr) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");

        // No subscribe frame in legacy mode; data flows immediately
        let frames = [
            json!({
                "city": "Athens", "location": "37.98,23.72",
                "parameter": "o3", "value": 61.0,
                "timestamp": "2025-06-01T10:00:00Z"
            }),
            json!({
                "city": "Athens", "location": "37.98,23.72",
                "parameter": "pm2.5", "value": 18.4,
                "timestamp": "2025-06-01T10:00:00Z"
            }),
        ];
        for frame in frames {
            ws.send(Message::Text(frame.to_string())).await.expect("send");
        }

        while let Some(msg) = ws.next().await {
            if msg.is_err() {
                break;
            }
        }
    });

    let store = Arc::new(LiveStore::new());
    let (feed, events) = FeedClient::spawn(feed_config(
        format!("ws://{}/ws/alerts", addr),
        FeedMode::Legacy,
    ));
    let dispatcher = spawn_dispatcher(Arc::clone(&store), events);

    wait_for_generation(&store, 1).await;

    let point = store.get(&LocationKey::new(37.98, 23.72)).expect("point");
    assert_eq!(point.pm25, 18.4);
    assert_eq!(point.description.as_deref(), Some("Athens"));
    // The non-PM2.5 frame was a decode error, not an upsert
    assert_eq!(store.len(), 1);
    assert_eq!(feed.decode_failures(), 1);

    feed.shutdown().await;
    let _ = dispatcher.await;
    server.abort();
}

#[tokio::test]
async fn shutdown_closes_the_socket_deterministically() {
    let (listener, addr) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");
        let _ = ws.next().await; // subscribe frame

        // The next thing the broker sees must be the close
        matches!(ws.next().await, Some(Ok(Message::Close(_))) | None)
    });

    let (feed, mut events) =
        FeedClient::spawn(feed_config(format!("ws://{}", addr), FeedMode::Pubsub));

    assert_eq!(events.recv().await, Some(FeedEvent::Connected));

    tokio::time::timeout(Duration::from_secs(1), feed.shutdown())
        .await
        .expect("shutdown should resolve promptly");

    // The connection task is gone, so the event channel is closed
    assert_eq!(events.recv().await, None);

    let saw_close = tokio::time::timeout(Duration::from_secs(1), server)
        .await
        .expect("broker should observe the close")
        .expect("broker task");
    assert!(saw_close);
}

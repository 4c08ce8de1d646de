//! Feed connection client
//!
//! Maintains the WebSocket subscription to the alert topic. Handles
//! reconnection with exponential backoff and re-subscribes after every
//! successful connect. Shutdown closes the socket deterministically; no
//! subscription survives the client's lifetime.

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::FeedEvent;
use crate::config::{Args, FeedMode};

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_millis(100);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);
const EVENT_CHANNEL_CAPACITY: usize = 256;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection settings for the feed task
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Full endpoint URL, including the `/ws/alerts` path in legacy mode
    pub url: String,
    pub mode: FeedMode,
    pub topic: String,
    pub qos: u8,
    pub client_id: String,
}

impl FeedConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            url: args.feed_url(),
            mode: args.feed_mode,
            topic: args.topic.clone(),
            qos: args.qos,
            client_id: args.client_id.to_string(),
        }
    }
}

/// Handle to the spawned feed connection task.
///
/// The task reconnects on its own until `shutdown()` is called; dropping the
/// event receiver also ends it.
pub struct FeedClient {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    decode_failures: Arc<AtomicU64>,
}

impl FeedClient {
    /// Spawn the connection task and return the typed event stream.
    pub fn spawn(config: FeedConfig) -> (Self, mpsc::Receiver<FeedEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let decode_failures = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&decode_failures);
        let task = tokio::spawn(async move {
            connection_loop(config, event_tx, shutdown_rx, counter).await;
        });

        (
            Self {
                shutdown,
                task,
                decode_failures,
            },
            event_rx,
        )
    }

    /// Frames dropped because they failed to decode since startup
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    /// Signal the connection task to close the socket and stop.
    ///
    /// Resolves only after the task has finished, so no subscription or
    /// in-flight state outlives this call.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Main connection loop with reconnection logic
async fn connection_loop(
    config: FeedConfig,
    events: mpsc::Sender<FeedEvent>,
    mut shutdown: watch::Receiver<bool>,
    decode_failures: Arc<AtomicU64>,
) {
    let mut reconnect_delay = INITIAL_RECONNECT_DELAY;

    loop {
        if *shutdown.borrow() {
            break;
        }

        info!(
            client_id = %config.client_id,
            "Connecting to alert feed at {}",
            config.url
        );

        // Shutdown must not wait out a connect attempt to an unreachable
        // broker, so the connect is raced against the shutdown signal
        let connected = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            result = connect_async(config.url.as_str()) => result,
        };

        match connected {
            Ok((mut ws, _)) => {
                reconnect_delay = INITIAL_RECONNECT_DELAY;

                match establish(&config, &mut ws).await {
                    Ok(()) => {
                        if events.send(FeedEvent::Connected).await.is_err() {
                            let _ = ws.close(None).await;
                            break;
                        }

                        if pump(&config, &mut ws, &events, &mut shutdown, &decode_failures).await {
                            let _ = ws.close(None).await;
                            debug!("Feed connection closed on shutdown");
                            break;
                        }
                    }
                    Err(reason) => {
                        // Signal and let the reconnect loop try again
                        let _ = ws.close(None).await;
                        if events
                            .send(FeedEvent::TransportFailed(reason))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                if events
                    .send(FeedEvent::TransportFailed(format!(
                        "connect to {} failed: {}",
                        config.url, e
                    )))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }

        warn!("Reconnecting to alert feed in {:?}...", reconnect_delay);
        tokio::select! {
            _ = tokio::time::sleep(reconnect_delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
        reconnect_delay = (reconnect_delay * 2).min(MAX_RECONNECT_DELAY);
    }
}

/// Send the subscribe frame after connect. Legacy endpoints deliver data
/// without a handshake.
async fn establish(config: &FeedConfig, ws: &mut WsStream) -> Result<(), String> {
    if config.mode != FeedMode::Pubsub {
        return Ok(());
    }

    let frame = json!({
        "action": "subscribe",
        "topic": config.topic,
        "qos": config.qos,
    });

    ws.send(Message::Text(frame.to_string()))
        .await
        .map_err(|e| format!("subscribe to {} failed: {}", config.topic, e))?;

    debug!(topic = %config.topic, qos = config.qos, "Subscription requested");
    Ok(())
}

/// Read frames until disconnect or shutdown. Returns true when shutdown was
/// requested, false to reconnect.
async fn pump(
    config: &FeedConfig,
    ws: &mut WsStream,
    events: &mpsc::Sender<FeedEvent>,
    shutdown: &mut watch::Receiver<bool>,
    decode_failures: &AtomicU64,
) -> bool {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                // A dropped shutdown sender means the client handle is gone
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match super::codec::decode_frame(config.mode, &text) {
                        Ok(point) => {
                            if events.send(FeedEvent::Decoded(point)).await.is_err() {
                                return true;
                            }
                        }
                        Err(e) => {
                            decode_failures.fetch_add(1, Ordering::Relaxed);
                            warn!("Dropping undecodable frame: {}", e);
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = ws.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("Alert feed closed the connection: {:?}", frame);
                    return false;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events
                        .send(FeedEvent::TransportFailed(format!("read error: {}", e)))
                        .await;
                    return false;
                }
                None => {
                    return false;
                }
            }
        }
    }
}

//! Live alert ingestion
//!
//! The feed client owns the WebSocket connection and emits a typed event
//! stream; a single dispatcher loop consumes it and applies decoded alerts
//! to the live store in arrival order. No buffering or reordering happens on
//! this path.

pub mod client;
pub mod codec;

pub use client::{FeedClient, FeedConfig};

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::model::AlertPoint;
use crate::store::LiveStore;

/// Events emitted by the feed connection task
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Transport connected and, in pubsub mode, the subscription was sent
    Connected,
    /// A well-formed alert frame
    Decoded(AlertPoint),
    /// Connect, subscribe, or read failure; the connection task keeps
    /// reconnecting on its own
    TransportFailed(String),
}

/// Spawn the single consumer loop applying feed events to the store.
///
/// Exits when the feed client shuts down and drops its end of the channel.
pub fn spawn_dispatcher(
    store: Arc<LiveStore>,
    mut events: mpsc::Receiver<FeedEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                FeedEvent::Connected => {
                    info!("Alert feed connected");
                }
                FeedEvent::Decoded(point) => {
                    debug!(
                        lat = point.lat,
                        lon = point.lon,
                        pm25 = point.pm25,
                        "Applying alert"
                    );
                    store.upsert(point);
                }
                FeedEvent::TransportFailed(reason) => {
                    warn!("Alert feed transport failure: {}", reason);
                }
            }
        }
        debug!("Feed event channel closed, dispatcher exiting");
    })
}

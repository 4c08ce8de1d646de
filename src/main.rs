//! miasma - live air-quality alert reconciliation daemon
//!
//! Wires the feed client and dispatcher into the live store and runs until
//! interrupted. History, acknowledgement, and preference clients are library
//! surface consumed on demand by a presentation layer.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use miasma::{
    config::Args,
    ingest::{spawn_dispatcher, FeedClient, FeedConfig},
    store::LiveStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("miasma={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  miasma - live alert reconciliation");
    info!("======================================");
    info!(
        "Build: {} ({})",
        option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        option_env!("BUILD_TIMESTAMP").unwrap_or("unknown")
    );
    info!("Client ID: {}", args.client_id);
    info!("Feed: {} ({} mode)", args.feed_url(), args.feed_mode);
    info!("Topic: {} (qos {})", args.topic, args.qos);
    info!("API base: {}", args.api_url());
    info!("User: {}", args.user_id);
    info!("======================================");

    let store = Arc::new(LiveStore::new());

    let (feed, events) = FeedClient::spawn(FeedConfig::from_args(&args));
    let dispatcher = spawn_dispatcher(Arc::clone(&store), events);

    // Periodic table summary for operators
    let stats_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await;
        loop {
            interval.tick().await;
            let stats = stats_store.stats();
            debug!(
                "Live store: {} locations, generation {}",
                stats.total_points, stats.generation
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    // Closing the feed drops the event channel, which ends the dispatcher
    feed.shutdown().await;
    let _ = dispatcher.await;

    let stats = store.stats();
    info!(
        "Shut down with {} locations after {} updates",
        stats.total_points, stats.generation
    );

    Ok(())
}

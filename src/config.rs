//! Configuration for miasma
//!
//! CLI arguments and environment variable handling using clap. Every setting
//! is passed explicitly at construction time to the components that need it;
//! nothing reads the environment after startup.

use clap::{Parser, ValueEnum};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// How the alert feed delivers frames
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// Subscribe handshake on connect, bare alert payloads after
    Pubsub,
    /// Raw `/ws/alerts` endpoint, legacy city-keyed frames, no handshake
    Legacy,
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedMode::Pubsub => f.write_str("pubsub"),
            FeedMode::Legacy => f.write_str("legacy"),
        }
    }
}

/// miasma - live air-quality alert reconciliation
#[derive(Parser, Debug, Clone)]
#[command(name = "miasma")]
#[command(about = "Live air-quality alert reconciliation daemon")]
pub struct Args {
    /// WebSocket broker endpoint for the live alert feed
    #[arg(long, env = "BROKER_URL", default_value = "ws://localhost:9001")]
    pub broker_url: String,

    /// Feed delivery mode
    #[arg(long, env = "FEED_MODE", value_enum, default_value = "pubsub")]
    pub feed_mode: FeedMode,

    /// Topic to subscribe to in pubsub mode
    #[arg(long, env = "ALERT_TOPIC", default_value = "alerts")]
    pub topic: String,

    /// Subscription quality of service (0 = at-most-once)
    #[arg(long, env = "ALERT_QOS", default_value = "0")]
    pub qos: u8,

    /// Base URL of the history/preferences REST backend
    #[arg(long, env = "API_BASE", default_value = "http://localhost:8000/api")]
    pub api_base: String,

    /// User whose preferences are loaded and saved
    #[arg(long, env = "ALERT_USER_ID", default_value = "current_user")]
    pub user_id: String,

    /// Client identifier for this feed connection
    #[arg(long, env = "CLIENT_ID", default_value_t = Uuid::new_v4())]
    pub client_id: Uuid,

    /// Backend request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// The URL the feed client actually connects to.
    ///
    /// In legacy mode the broker exposes one raw endpoint at `/ws/alerts`,
    /// appended here when the configured URL carries no path of its own.
    pub fn feed_url(&self) -> String {
        match self.feed_mode {
            FeedMode::Pubsub => self.broker_url.clone(),
            FeedMode::Legacy => {
                if let Some(scheme_end) = self.broker_url.find("://") {
                    let after_scheme = &self.broker_url[scheme_end + 3..];
                    if after_scheme.contains('/') {
                        return self.broker_url.clone();
                    }
                }
                format!("{}/ws/alerts", self.broker_url)
            }
        }
    }

    /// REST base URL without a trailing slash
    pub fn api_url(&self) -> String {
        self.api_base.trim_end_matches('/').to_string()
    }

    /// Backend request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.broker_url.starts_with("ws://") && !self.broker_url.starts_with("wss://") {
            return Err(format!(
                "BROKER_URL must use a ws:// or wss:// scheme, got {}",
                self.broker_url
            ));
        }

        if self.topic.trim().is_empty() {
            return Err("ALERT_TOPIC must not be empty".to_string());
        }

        if self.qos > 1 {
            return Err(format!("ALERT_QOS must be 0 or 1, got {}", self.qos));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Args {
        Args::parse_from(["miasma"])
    }

    #[test]
    fn test_defaults_are_valid() {
        let args = defaults();
        assert!(args.validate().is_ok());
        assert_eq!(args.broker_url, "ws://localhost:9001");
        assert_eq!(args.topic, "alerts");
        assert_eq!(args.qos, 0);
        assert_eq!(args.feed_mode, FeedMode::Pubsub);
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut args = defaults();
        args.broker_url = "http://localhost:9001".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_topic() {
        let mut args = defaults();
        args.topic = "  ".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_high_qos() {
        let mut args = defaults();
        args.qos = 2;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_feed_url_pubsub_unchanged() {
        let args = defaults();
        assert_eq!(args.feed_url(), "ws://localhost:9001");
    }

    #[test]
    fn test_feed_url_legacy_appends_path() {
        let mut args = defaults();
        args.feed_mode = FeedMode::Legacy;
        assert_eq!(args.feed_url(), "ws://localhost:9001/ws/alerts");
    }

    #[test]
    fn test_feed_url_legacy_keeps_explicit_path() {
        let mut args = defaults();
        args.feed_mode = FeedMode::Legacy;
        args.broker_url = "ws://broker:9001/ws/alerts".to_string();
        assert_eq!(args.feed_url(), "ws://broker:9001/ws/alerts");
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let mut args = defaults();
        args.api_base = "http://localhost:8000/api/".to_string();
        assert_eq!(args.api_url(), "http://localhost:8000/api");
    }
}

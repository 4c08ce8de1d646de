//! Backend query clients
//!
//! On-demand REST clients for the history/preferences backend. Results are
//! transient, re-fetchable copies owned by the backend; nothing here is
//! cached beyond the current query cycle or merged with the live store.

pub mod acknowledge;
pub mod history;
pub mod preferences;

pub use acknowledge::{mark_acknowledged, AcknowledgeClient};
pub use history::{HistoryClient, LocationDetail};
pub use preferences::PreferenceManager;

use serde::Deserialize;

/// `{status}` confirmation body returned by mutation endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    #[allow(dead_code)]
    pub status: String,
}

/// Shared HTTP client construction with the configured request timeout
pub(crate) fn build_http_client(request_timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .user_agent(concat!("miasma/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

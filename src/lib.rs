//! miasma - live air-quality alert reconciliation
//!
//! Consumes a continuous, possibly-duplicated stream of per-location PM2.5
//! alert events over a WebSocket feed, maintains one canonical current value
//! per location, and exposes that view alongside on-demand history queries,
//! acknowledgement, and notification preferences.
//!
//! ## Components
//!
//! - **ingest**: WebSocket feed client with reconnect, typed event stream,
//!   and the dispatcher loop feeding the store
//! - **store**: last-write-wins live table with consistent snapshots
//! - **services**: history/stats/trend queries, acknowledgement workflow,
//!   preference manager
//! - **model**: wire types and PM2.5 guideline thresholds

pub mod config;
pub mod ingest;
pub mod model;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use store::{LiveStore, LocationKey};
pub use types::{MiasmaError, Result};

//! Core error types for miasma
//!
//! One error enum covers the whole crate. None of these are fatal to the
//! process: the feed keeps reconnecting through transport errors, undecodable
//! frames are dropped, and failed backend operations leave local state
//! untouched so the caller can retry.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MiasmaError>;

/// Errors surfaced by the reconciliation layer
#[derive(Debug, Error)]
pub enum MiasmaError {
    /// Feed connect, subscribe, or read failure. The connection task keeps
    /// reconnecting; no event-loss accounting is attempted.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed inbound payload. The frame is discarded and processing
    /// continues with the next message.
    #[error("Decode error: {0}")]
    Decode(String),

    /// History, statistics, trend, or preference fetch failure.
    #[error("Query error: {0}")]
    Query(String),

    /// Acknowledge request failure. The local record is left unchanged.
    #[error("Acknowledge error: {0}")]
    Acknowledge(String),

    /// Preference save failure. The in-memory draft is kept but unconfirmed.
    #[error("Save error: {0}")]
    Save(String),

    /// Closed channels and other should-not-happen states.
    #[error("Internal error: {0}")]
    Internal(String),
}

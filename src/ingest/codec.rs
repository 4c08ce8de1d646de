//! Inbound frame decoding
//!
//! Two wire schemas arrive over the feed: the current bare alert payload and
//! the legacy city-keyed frame. Either decodes into an `AlertPoint` or fails
//! as a `Decode` error; the caller drops the frame and keeps reading.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::FeedMode;
use crate::model::AlertPoint;
use crate::types::{MiasmaError, Result};

/// Legacy feed frame, delivered without a subscribe handshake
#[derive(Debug, Deserialize)]
struct LegacyFrame {
    city: String,
    /// Coordinates as "lat,lon"
    location: String,
    parameter: String,
    value: f64,
    timestamp: String,
}

/// Decode one text frame under the configured feed mode
pub fn decode_frame(mode: FeedMode, payload: &str) -> Result<AlertPoint> {
    match mode {
        FeedMode::Pubsub => decode_alert(payload),
        FeedMode::Legacy => decode_legacy(payload),
    }
}

fn decode_alert(payload: &str) -> Result<AlertPoint> {
    serde_json::from_str(payload)
        .map_err(|e| MiasmaError::Decode(format!("bad alert payload: {}", e)))
}

fn decode_legacy(payload: &str) -> Result<AlertPoint> {
    let frame: LegacyFrame = serde_json::from_str(payload)
        .map_err(|e| MiasmaError::Decode(format!("bad legacy frame: {}", e)))?;

    if !matches!(
        frame.parameter.to_ascii_lowercase().as_str(),
        "pm25" | "pm2.5"
    ) {
        return Err(MiasmaError::Decode(format!(
            "unsupported parameter: {}",
            frame.parameter
        )));
    }

    let (lat, lon) = parse_location(&frame.location)?;

    // Legacy timestamps are best-effort; an unparseable one is treated as
    // absent rather than failing the whole frame
    let timestamp = DateTime::parse_from_rfc3339(&frame.timestamp)
        .ok()
        .map(|t| t.with_timezone(&Utc));

    let mut point = AlertPoint::new(lat, lon, frame.value).with_description(frame.city);
    point.timestamp = timestamp;
    Ok(point)
}

/// Parse a "lat,lon" coordinate pair. Frames without usable coordinates
/// cannot be keyed and are dropped.
fn parse_location(location: &str) -> Result<(f64, f64)> {
    let mut parts = location.split(',');
    let lat = parts.next().and_then(|s| s.trim().parse::<f64>().ok());
    let lon = parts.next().and_then(|s| s.trim().parse::<f64>().ok());

    match (lat, lon, parts.next()) {
        (Some(lat), Some(lon), None) => Ok((lat, lon)),
        _ => Err(MiasmaError::Decode(format!(
            "unusable location: {}",
            location
        ))),
    }
}

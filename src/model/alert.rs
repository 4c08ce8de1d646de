//! Alert wire types
//!
//! Records exchanged with the alert feed and the history backend. Live
//! `AlertPoint`s are owned by the store; everything else is fetched on demand
//! and held only for the current query cycle.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal alert severity, least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Alert,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Alert => "alert",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinate pair as the backend delivers it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Current-state alert for one location, as delivered by the live feed.
///
/// `lat`/`lon`/`pm25` are required on the wire; everything else is optional
/// and absent fields stay `None` rather than being given substitute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPoint {
    pub lat: f64,
    pub lon: f64,
    /// PM2.5 concentration in µg/m³
    pub pm25: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Measurement time; feeds may deliver null or omit it entirely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Threshold value that triggered the alert, when the producer knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AlertPoint {
    /// Create a point with only the required fields set
    pub fn new(lat: f64, lon: f64, pm25: f64) -> Self {
        Self {
            lat,
            lon,
            pm25,
            unit: None,
            timestamp: None,
            severity: None,
            threshold: None,
            description: None,
        }
    }

    /// Set the measurement unit
    pub fn with_unit(mut self, unit: String) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the measurement time
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Set the triggering threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the display text
    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    /// Measurement unit for display, defaulting to µg/m³ when the feed
    /// omitted it
    pub fn unit_or_default(&self) -> &str {
        self.unit.as_deref().unwrap_or("µg/m³")
    }
}

/// Historical alert entry owned by the backend.
///
/// Retrieved read-only; the only mutation this layer ever applies is the
/// one-way `acknowledge` transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Opaque unique identifier assigned by the backend
    pub id: String,
    pub location: GeoPoint,
    pub pm25: f64,
    pub severity: Severity,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Who acknowledged, filled in by the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl AlertRecord {
    /// Mark this record acknowledged.
    ///
    /// The transition is one-way: there is no inverse operation, and
    /// acknowledging an already-acknowledged record changes nothing.
    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }
}

/// Daily aggregate statistics for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub avg_pm25: f64,
    pub max_pm25: f64,
    pub min_pm25: f64,
    pub alert_count: u32,
}

/// Trend series for one location.
///
/// The wire format carries parallel arrays of dates and values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendData {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl TrendData {
    /// Chronologically ordered (date, value) pairs.
    ///
    /// Pairing stops at the shorter array if the backend ever delivers
    /// mismatched lengths.
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.dates.len().min(self.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

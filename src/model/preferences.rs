//! Notification preference types
//!
//! A user's alert filtering rules: which severities and channels they care
//! about, the PM2.5 band they want to see, and optional geographic limits.
//! Edit operations here mutate the in-memory draft only; persistence goes
//! through the preference manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::model::alert::{AlertPoint, Severity};
use crate::model::thresholds;

/// Delivery channel for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Web,
    Email,
    Sms,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Web => "web",
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic gate: a point passes when it lies within `radius` kilometers
/// of the filter center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFilter {
    pub lat: f64,
    pub lon: f64,
    /// Radius in kilometers
    pub radius: f64,
}

impl LocationFilter {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        haversine_km(self.lat, self.lon, lat, lon) <= self.radius
    }
}

/// Great-circle distance between two coordinates in kilometers
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
}

/// Alert filtering rules for one user.
///
/// Absent thresholds and an absent location filter mean "no restriction" on
/// that axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPreference {
    pub severity_levels: BTreeSet<Severity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_filter: Option<Vec<LocationFilter>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_threshold: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_threshold: Option<f64>,

    pub notification_channels: BTreeSet<NotificationChannel>,
}

impl Default for AlertPreference {
    /// The documented client-side defaults: warning and above, web
    /// notifications, PM2.5 between 10 and 50 µg/m³.
    fn default() -> Self {
        Self {
            severity_levels: BTreeSet::from([
                Severity::Warning,
                Severity::Alert,
                Severity::Critical,
            ]),
            location_filter: None,
            min_threshold: Some(10.0),
            max_threshold: Some(50.0),
            notification_channels: BTreeSet::from([NotificationChannel::Web]),
        }
    }
}

impl AlertPreference {
    /// Add the severity if absent, remove it if present
    pub fn toggle_severity(&mut self, severity: Severity) {
        if !self.severity_levels.remove(&severity) {
            self.severity_levels.insert(severity);
        }
    }

    /// Add the channel if absent, remove it if present
    pub fn toggle_channel(&mut self, channel: NotificationChannel) {
        if !self.notification_channels.remove(&channel) {
            self.notification_channels.insert(channel);
        }
    }

    pub fn set_min_threshold(&mut self, threshold: Option<f64>) {
        self.min_threshold = threshold;
    }

    pub fn set_max_threshold(&mut self, threshold: Option<f64>) {
        self.max_threshold = threshold;
    }

    /// Whether a live alert passes the severity, threshold, and location
    /// gates.
    ///
    /// Points that arrive without a severity are classified against the
    /// PM2.5 guideline table first. Never contacts the backend.
    pub fn matches(&self, point: &AlertPoint) -> bool {
        let severity = point
            .severity
            .unwrap_or_else(|| thresholds::severity_for(point.pm25));
        if !self.severity_levels.contains(&severity) {
            return false;
        }

        if let Some(min) = self.min_threshold {
            if point.pm25 < min {
                return false;
            }
        }
        if let Some(max) = self.max_threshold {
            if point.pm25 > max {
                return false;
            }
        }

        match self.location_filter.as_deref() {
            Some(filters) if !filters.is_empty() => {
                filters.iter().any(|f| f.contains(point.lat, point.lon))
            }
            _ => true,
        }
    }
}

/// Stored preferences for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    pub alert_preferences: AlertPreference,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    /// Synthesized defaults, used when the backend has no stored entry or
    /// cannot be reached
    pub fn defaults(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            email: None,
            alert_preferences: AlertPreference::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

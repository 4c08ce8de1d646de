//! History query client
//!
//! Fetches historical alert records, daily aggregates, and trend series for
//! a location. The detail-panel load is a single fail-fast sequence: the
//! first failing query aborts the rest and the caller observes one error.

use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::model::{AlertRecord, DailyStats, TrendData};
use crate::types::{MiasmaError, Result};

/// Everything the detail panel needs for one location
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDetail {
    pub alerts: Vec<AlertRecord>,
    pub daily: DailyStats,
    pub trend: TrendData,
}

/// Client for the history/statistics endpoints
pub struct HistoryClient {
    base_url: String,
    http: reqwest::Client,
}

impl HistoryClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: super::build_http_client(request_timeout),
        }
    }

    /// Historical alert records for a location
    pub async fn fetch_history(&self, lat: f64, lon: f64) -> Result<Vec<AlertRecord>> {
        self.get_json(&format!("{}/alerts/history", self.base_url), lat, lon)
            .await
    }

    /// Daily aggregate statistics for a location
    pub async fn fetch_daily_stats(&self, lat: f64, lon: f64) -> Result<DailyStats> {
        self.get_json(&format!("{}/analysis/daily", self.base_url), lat, lon)
            .await
    }

    /// Trend time series for a location
    pub async fn fetch_trends(&self, lat: f64, lon: f64) -> Result<TrendData> {
        self.get_json(&format!("{}/analysis/trends", self.base_url), lat, lon)
            .await
    }

    /// Load the full detail panel as one fail-fast sequence.
    ///
    /// The three queries run in order; a failure aborts the remaining ones
    /// and surfaces as the single error for the whole operation.
    pub async fn load_detail(&self, lat: f64, lon: f64) -> Result<LocationDetail> {
        let alerts = self.fetch_history(lat, lon).await?;
        let daily = self.fetch_daily_stats(lat, lon).await?;
        let trend = self.fetch_trends(lat, lon).await?;

        debug!(
            lat,
            lon,
            records = alerts.len(),
            trend_points = trend.len(),
            "Location detail loaded"
        );

        Ok(LocationDetail {
            alerts,
            daily,
            trend,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, lat: f64, lon: f64) -> Result<T> {
        let response = self
            .http
            .get(url)
            .query(&[("lat", lat), ("lon", lon)])
            .send()
            .await
            .map_err(|e| MiasmaError::Query(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(MiasmaError::Query(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MiasmaError::Query(format!("bad body from {}: {}", url, e)))
    }
}

//! Preference manager
//!
//! Loads and persists one user's notification preferences. A failed load
//! synthesizes the documented defaults so the caller always gets a usable
//! value; a successful save is confirmed by re-fetching the canonical stored
//! value rather than trusting the optimistic write.

use std::time::Duration;
use tracing::{debug, warn};

use crate::model::UserPreferences;
use crate::types::{MiasmaError, Result};

/// Client for the preferences endpoints, bound to one user
pub struct PreferenceManager {
    base_url: String,
    user_id: String,
    http: reqwest::Client,
}

impl PreferenceManager {
    pub fn new(
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.into(),
            http: super::build_http_client(request_timeout),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Fetch the stored preferences, propagating any failure
    pub async fn fetch(&self) -> Result<UserPreferences> {
        let url = format!("{}/preferences/{}", self.base_url, self.user_id);

        let response = self
            .http
            .get(&url)
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

    /// Load preferences, falling back to defaults on any failure.
    ///
    /// Never returns an error: an unreachable backend yields the documented
    /// default set (warning and above, web channel, 10-50 µg/m³ band).
    pub async fn load(&self) -> UserPreferences {
        match self.fetch().await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(
                    user_id = %self.user_id,
                    "Preference load failed, synthesizing defaults: {}",
                    e
                );
                UserPreferences::defaults(self.user_id.clone())
            }
        }
    }

    /// Persist edited preferences, then return what the backend actually
    /// stored.
    ///
    /// On failure the caller's in-memory draft is untouched but unconfirmed.
    pub async fn save(&self, prefs: &UserPreferences) -> Result<UserPreferences> {
        let url = format!("{}/preferences/{}", self.base_url, self.user_id);

        let response = self
            .http
            .post(&url)
            .json(prefs)
            .send()
            .await
            .map_err(|e| MiasmaError::Save(format!("POST {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(MiasmaError::Save(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let confirmation: super::StatusResponse = response
            .json()
            .await
            .map_err(|e| MiasmaError::Save(format!("bad body from {}: {}", url, e)))?;

        debug!(user_id = %self.user_id, status = %confirmation.status, "Preferences saved");

        // Round-trip confirmation: display what was actually stored
        self.fetch()
            .await
            .map_err(|e| MiasmaError::Save(format!("saved but confirmation fetch failed: {}", e)))
    }
}

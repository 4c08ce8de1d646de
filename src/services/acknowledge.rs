//! Acknowledgement workflow
//!
//! One-way transition per alert record: New -> Acknowledged, keyed by record
//! id. The local copy is flipped only after the backend confirms; on failure
//! nothing changes and the caller may retry.

use std::time::Duration;
use tracing::debug;

use crate::model::AlertRecord;
use crate::types::{MiasmaError, Result};

/// Client for the acknowledge endpoint
pub struct AcknowledgeClient {
    base_url: String,
    http: reqwest::Client,
}

impl AcknowledgeClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: super::build_http_client(request_timeout),
        }
    }

    /// Acknowledge a record and reconcile the caller's copy in place.
    ///
    /// An already-acknowledged record is a no-op success; the transition
    /// never reverses at this layer.
    pub async fn acknowledge(&self, record: &mut AlertRecord) -> Result<()> {
        if record.acknowledged {
            return Ok(());
        }

        self.acknowledge_id(&record.id).await?;
        record.acknowledge();
        Ok(())
    }

    /// Acknowledge by raw record id
    pub async fn acknowledge_id(&self, id: &str) -> Result<()> {
        let url = format!("{}/alerts/{}/acknowledge", self.base_url, id);

        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| MiasmaError::Acknowledge(format!("POST {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(MiasmaError::Acknowledge(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let confirmation: super::StatusResponse = response
            .json()
            .await
            .map_err(|e| MiasmaError::Acknowledge(format!("bad body from {}: {}", url, e)))?;

        debug!(id, status = %confirmation.status, "Alert acknowledged");
        Ok(())
    }
}

/// Reconcile a fetched record list after a confirmed acknowledge.
///
/// Returns true when a record with the given id was found.
pub fn mark_acknowledged(records: &mut [AlertRecord], id: &str) -> bool {
    match records.iter_mut().find(|r| r.id == id) {
        Some(record) => {
            record.acknowledge();
            true
        }
        None => false,
    }
}

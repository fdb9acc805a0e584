//! Client for the listen statistics endpoint.

use crate::catalog::{ensure_success, parse_response};
use crate::error::ApiError;
use crate::track::{ListenReport, Stat};

#[derive(Debug, Clone)]
pub struct StatsClient {
    client: reqwest::Client,
    api_url: String,
}

impl StatsClient {
    pub fn new(api_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Per-track aggregates, most played first. The backend does the
    /// ordering; the list is returned as received.
    pub async fn list(&self) -> Result<Vec<Stat>, ApiError> {
        let response = self.client.get(&self.api_url).send().await?;
        parse_response(response).await
    }

    pub async fn record(&self, report: ListenReport) -> Result<(), ApiError> {
        let response = self.client.post(&self.api_url).json(&report).send().await?;
        ensure_success(response).await?;
        tracing::debug!(
            track_id = report.track_id,
            duration_seconds = report.duration_seconds,
            "Listen recorded"
        );
        Ok(())
    }

    /// Fire-and-forget variant of [`record`](Self::record): failures are
    /// logged and otherwise dropped.
    pub async fn record_logged(self, report: ListenReport) {
        if let Err(e) = self.record(report).await {
            tracing::warn!(
                error = %e,
                track_id = report.track_id,
                duration_seconds = report.duration_seconds,
                "Failed to record listen"
            );
        }
    }
}

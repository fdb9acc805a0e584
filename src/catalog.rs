//! Client for the remote track catalog.
//!
//! `GET ?path=list[&limit=N]` returns the active tracks, newest first.
//! `POST` with a [`NewTrack`] body creates one.

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::track::{NewTrack, Track};

/// Read/write access to the catalog. The bulk importer is written against
/// this so it can be driven without a network.
pub trait TrackCatalog {
    fn list(&self, limit: Option<u32>) -> impl Future<Output = Result<Vec<Track>, ApiError>> + Send;

    fn create(&self, track: &NewTrack) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    api_url: String,
}

impl CatalogClient {
    pub fn new(api_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`] so both endpoints share a pool.
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }
}

impl TrackCatalog for CatalogClient {
    async fn list(&self, limit: Option<u32>) -> Result<Vec<Track>, ApiError> {
        let mut request = self.client.get(&self.api_url).query(&[("path", "list")]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        let tracks: Vec<Track> = parse_response(request.send().await?).await?;
        tracing::debug!(count = tracks.len(), ?limit, "Catalog listed");
        Ok(tracks)
    }

    async fn create(&self, track: &NewTrack) -> Result<(), ApiError> {
        let response = self.client.post(&self.api_url).json(track).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into [`ApiError::Status`], keeping the body
/// for the log.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let body = ensure_success(response).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}

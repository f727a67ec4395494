//! Remote taxon metadata client
//!
//! `GET {base}/taxa/{id}` returns `{ "results": [taxon, ...] }`; the first
//! result is the requested taxon.

use crate::models::TaxonRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// User agent sent to the remote services
pub const USER_AGENT: &str = concat!("fieldguide-id/", env!("CARGO_PKG_VERSION"));

/// Taxon metadata errors
#[derive(Debug, Error)]
pub enum TaxaError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Taxon {0} not found")]
    NotFound(i64),
}

/// Source of taxon metadata
#[async_trait]
pub trait TaxonMetadataSource: Send + Sync {
    /// Fetch the taxon record for `taxon_id`
    async fn fetch_taxon(&self, taxon_id: i64) -> Result<TaxonRecord, TaxaError>;
}

#[derive(Debug, Deserialize)]
struct TaxaResponse {
    #[serde(default)]
    results: Vec<TaxonRecord>,
}

/// HTTP client for the taxa endpoint
pub struct TaxaClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl TaxaClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TaxaError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TaxaError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TaxonMetadataSource for TaxaClient {
    async fn fetch_taxon(&self, taxon_id: i64) -> Result<TaxonRecord, TaxaError> {
        let url = format!("{}/taxa/{}", self.base_url, taxon_id);

        tracing::debug!(taxon_id, url = %url, "Fetching taxon metadata");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| TaxaError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TaxaError::NotFound(taxon_id));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TaxaError::ApiError(status.as_u16(), error_text));
        }

        let body: TaxaResponse = response
            .json()
            .await
            .map_err(|e| TaxaError::ParseError(e.to_string()))?;

        body.results
            .into_iter()
            .next()
            .ok_or(TaxaError::NotFound(taxon_id))
    }
}

//! Remote vision scorer client
//!
//! Uploads an image as multipart form data and returns ranked results plus
//! an optional common ancestor. The service signals maintenance with a 503
//! and a `retry-after` header, kept on the error for the caller.

use crate::models::{CapturedImage, TaxonRecord};
use crate::services::taxa_client::USER_AGENT;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Vision scorer errors
#[derive(Debug, Error)]
pub enum VisionError {
    /// No response at all (DNS, connect, reset)
    #[error("No response from vision service: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("Vision service returned {status}")]
    Status {
        status: u16,
        retry_after: Option<String>,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    /// Image file could not be read for upload
    #[error("Image unreadable: {0}")]
    Image(String),
}

/// One scored result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionResult {
    /// Combined vision + geo score, 0-100
    pub combined_score: f64,
    pub taxon: TaxonRecord,
}

/// Common ancestor of the top results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonAncestor {
    pub taxon: TaxonRecord,
}

/// Scoring response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionResponse {
    #[serde(default)]
    pub results: Vec<VisionResult>,
    #[serde(default)]
    pub common_ancestor: Option<CommonAncestor>,
}

/// Normalized upload parameters for one image
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPayload {
    pub image_path: PathBuf,
    /// ISO-8601 capture time
    pub observed_on: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl UploadPayload {
    pub fn from_image(image: &CapturedImage) -> Self {
        let path = image.uri.strip_prefix("file://").unwrap_or(&image.uri);
        let observed_on = Utc
            .timestamp_opt(image.time, 0)
            .single()
            .unwrap_or_else(Utc::now)
            .to_rfc3339();

        Self {
            image_path: PathBuf::from(path),
            observed_on,
            latitude: image.latitude,
            longitude: image.longitude,
        }
    }
}

/// Remote image scorer
#[async_trait]
pub trait VisionScorer: Send + Sync {
    async fn score_image(
        &self,
        payload: &UploadPayload,
        auth_token: &str,
    ) -> Result<VisionResponse, VisionError>;
}

/// HTTP client for the scoring endpoint
pub struct VisionClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl VisionClient {
    /// No client-level timeout; callers bound the whole call
    pub fn new(base_url: impl Into<String>) -> Result<Self, VisionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VisionError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/computervision/score_image", self.base_url)
    }
}

#[async_trait]
impl VisionScorer for VisionClient {
    async fn score_image(
        &self,
        payload: &UploadPayload,
        auth_token: &str,
    ) -> Result<VisionResponse, VisionError> {
        let bytes = tokio::fs::read(&payload.image_path)
            .await
            .map_err(|e| VisionError::Image(format!("{}: {}", payload.image_path.display(), e)))?;

        let image_part = reqwest::multipart::Part::bytes(bytes)
            .file_name("upload.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| VisionError::Image(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("image", image_part)
            .text("observed_on", payload.observed_on.clone());
        if let Some(latitude) = payload.latitude {
            form = form.text("latitude", latitude.to_string());
        }
        if let Some(longitude) = payload.longitude {
            form = form.text("longitude", longitude.to_string());
        }

        tracing::debug!(
            path = %payload.image_path.display(),
            has_location = payload.latitude.is_some(),
            "Scoring image with vision service"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header(reqwest::header::AUTHORIZATION, auth_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VisionError::Transport(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Err(VisionError::Status {
                status: status.as_u16(),
                retry_after,
            });
        }

        let body: VisionResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        tracing::info!(
            results = body.results.len(),
            top_score = body.results.first().map(|r| r.combined_score),
            has_common_ancestor = body.common_ancestor.is_some(),
            "Vision scoring complete"
        );

        Ok(body)
    }
}

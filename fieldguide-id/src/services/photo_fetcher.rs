//! Photo enrichment
//!
//! Looks up a representative photo for a taxon, bounded by a deadline.
//! Every failure degrades to `None`; a missing photo never blocks a result.

use crate::services::taxa_client::TaxonMetadataSource;
use std::sync::Arc;
use std::time::Duration;

/// Deadline for a photo lookup
pub const PHOTO_TIMEOUT_MS: u64 = 5000;

pub struct PhotoFetcher {
    source: Arc<dyn TaxonMetadataSource>,
    timeout: Duration,
}

impl PhotoFetcher {
    pub fn new(source: Arc<dyn TaxonMetadataSource>) -> Self {
        Self::with_timeout(source, Duration::from_millis(PHOTO_TIMEOUT_MS))
    }

    /// Fetcher with a non-default deadline
    pub fn with_timeout(source: Arc<dyn TaxonMetadataSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Medium photo URL for `taxon_id`, or `None` on timeout, failure, or no photo
    ///
    /// The lookup is dropped (cancelled) when the deadline passes.
    pub async fn fetch_photo(&self, taxon_id: i64) -> Option<String> {
        match tokio::time::timeout(self.timeout, self.source.fetch_taxon(taxon_id)).await {
            Ok(Ok(taxon)) => {
                let photo = taxon.photo_url();
                if photo.is_none() {
                    tracing::debug!(taxon_id, "Taxon has no default photo");
                }
                photo
            }
            Ok(Err(e)) => {
                tracing::warn!(taxon_id, error = %e, "Photo lookup failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    taxon_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Photo lookup timed out"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaxonPhoto, TaxonRecord};
    use crate::services::taxa_client::TaxaError;
    use async_trait::async_trait;
    use std::time::Instant;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl TaxonMetadataSource for Fixed {
        async fn fetch_taxon(&self, taxon_id: i64) -> Result<TaxonRecord, TaxaError> {
            Ok(TaxonRecord {
                id: taxon_id,
                name: "Danaus plexippus".to_string(),
                rank: Some("species".to_string()),
                rank_level: Some(10.0),
                default_photo: self.0.map(|url| TaxonPhoto {
                    medium_url: Some(url.to_string()),
                }),
                ancestor_ids: vec![],
                ancestors: vec![],
                iconic_taxon_id: None,
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl TaxonMetadataSource for Failing {
        async fn fetch_taxon(&self, _taxon_id: i64) -> Result<TaxonRecord, TaxaError> {
            Err(TaxaError::NetworkError("connection refused".to_string()))
        }
    }

    struct Hanging;

    #[async_trait]
    impl TaxonMetadataSource for Hanging {
        async fn fetch_taxon(&self, _taxon_id: i64) -> Result<TaxonRecord, TaxaError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_photo_found() {
        let fetcher = PhotoFetcher::new(Arc::new(Fixed(Some("https://example.org/5.jpg"))));
        assert_eq!(
            fetcher.fetch_photo(5).await.as_deref(),
            Some("https://example.org/5.jpg")
        );
    }

    #[tokio::test]
    async fn test_no_photo_on_record() {
        let fetcher = PhotoFetcher::new(Arc::new(Fixed(None)));
        assert!(fetcher.fetch_photo(5).await.is_none());
    }

    #[tokio::test]
    async fn test_failure_degrades_to_none() {
        let fetcher = PhotoFetcher::new(Arc::new(Failing));
        assert!(fetcher.fetch_photo(5).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_deadline_is_five_seconds() {
        let fetcher = PhotoFetcher::new(Arc::new(Hanging));
        let start = tokio::time::Instant::now();

        assert!(fetcher.fetch_photo(5).await.is_none());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(PHOTO_TIMEOUT_MS));
        assert!(elapsed < Duration::from_millis(PHOTO_TIMEOUT_MS + 100));
    }

    #[tokio::test]
    async fn test_short_deadline_real_time() {
        let fetcher = PhotoFetcher::with_timeout(Arc::new(Hanging), Duration::from_millis(50));
        let start = Instant::now();

        assert!(fetcher.fetch_photo(5).await.is_none());
        assert!(start.elapsed() < Duration::from_millis(1000));
    }
}

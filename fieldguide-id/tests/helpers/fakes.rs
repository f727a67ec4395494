//! Deterministic collaborators for resolution tests

use async_trait::async_trait;
use fieldguide_common::events::EventBus;
use fieldguide_id::models::{
    CapturedImage, IdentificationEvent, LocationPermission, Prediction, TaxonPhoto, TaxonRecord,
};
use fieldguide_id::services::location::ConfiguredLocationProvider;
use fieldguide_id::services::vision_client::{VisionError, VisionResult};
use fieldguide_id::services::{
    LocationResolver, PhotoFetcher, ResolutionOrchestrator, SeenLedger, TaxaError,
    TaxonMetadataSource, UploadPayload, VisionAuth, VisionBackend, VisionResponse, VisionScorer,
};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn taxon_record(taxon_id: i64, photo: Option<String>) -> TaxonRecord {
    TaxonRecord {
        id: taxon_id,
        name: format!("taxon {}", taxon_id),
        rank: None,
        rank_level: None,
        default_photo: photo.map(|url| TaxonPhoto {
            medium_url: Some(url),
        }),
        ancestor_ids: vec![],
        ancestors: vec![],
        iconic_taxon_id: None,
    }
}

/// Taxon source answering from a fixed photo table
#[derive(Default)]
pub struct StaticTaxonSource {
    photos: HashMap<i64, String>,
    calls: AtomicUsize,
}

impl StaticTaxonSource {
    pub fn with_photo(mut self, taxon_id: i64, url: &str) -> Self {
        self.photos.insert(taxon_id, url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaxonMetadataSource for StaticTaxonSource {
    async fn fetch_taxon(&self, taxon_id: i64) -> Result<TaxonRecord, TaxaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(taxon_record(taxon_id, self.photos.get(&taxon_id).cloned()))
    }
}

/// Taxon source that blocks until released
///
/// `started` fires when a lookup begins; lookups finish after `release`.
#[derive(Default)]
pub struct GatedTaxonSource {
    pub started: Notify,
    gate: Notify,
}

impl GatedTaxonSource {
    pub fn release(&self) {
        self.gate.notify_waiters();
    }
}

#[async_trait]
impl TaxonMetadataSource for GatedTaxonSource {
    async fn fetch_taxon(&self, taxon_id: i64) -> Result<TaxonRecord, TaxaError> {
        let released = self.gate.notified();
        self.started.notify_one();
        released.await;
        Ok(taxon_record(
            taxon_id,
            Some(format!("https://example.org/{}.jpg", taxon_id)),
        ))
    }
}

type ScoreFn = dyn Fn() -> Result<VisionResponse, VisionError> + Send + Sync;

/// Vision scorer returning a scripted outcome
pub struct FakeVisionScorer {
    outcome: Box<ScoreFn>,
    calls: AtomicUsize,
    last_payload: Mutex<Option<UploadPayload>>,
}

impl FakeVisionScorer {
    pub fn responding(response: VisionResponse) -> Self {
        Self::scripted(move || Ok(response.clone()))
    }

    pub fn failing(make_error: impl Fn() -> VisionError + Send + Sync + 'static) -> Self {
        Self::scripted(move || Err(make_error()))
    }

    pub fn scripted(
        outcome: impl Fn() -> Result<VisionResponse, VisionError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            outcome: Box::new(outcome),
            calls: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<UploadPayload> {
        self.last_payload.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionScorer for FakeVisionScorer {
    async fn score_image(
        &self,
        payload: &UploadPayload,
        auth_token: &str,
    ) -> Result<VisionResponse, VisionError> {
        assert!(!auth_token.is_empty(), "scorer called without a token");
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().unwrap() = Some(payload.clone());
        (self.outcome)()
    }
}

/// Orchestrator over the given collaborators with no device location
pub fn build_orchestrator(
    pool: SqlitePool,
    event_bus: EventBus,
    taxa: Arc<dyn TaxonMetadataSource>,
    vision: Option<Arc<dyn VisionScorer>>,
) -> ResolutionOrchestrator {
    let orchestrator = ResolutionOrchestrator::new(
        SeenLedger::new(pool, event_bus.clone()),
        PhotoFetcher::new(taxa),
        LocationResolver::new(Arc::new(ConfiguredLocationProvider::new(None))),
        event_bus,
    );

    match vision {
        Some(scorer) => orchestrator.with_vision(VisionBackend {
            scorer,
            auth: VisionAuth::new("test-secret"),
        }),
        None => orchestrator,
    }
}

pub fn prediction(taxon_id: i64, rank: i32, score: f64) -> Prediction {
    Prediction {
        taxon_id,
        name: format!("taxon {}", taxon_id),
        rank,
        score,
        ancestor_ids: vec![],
    }
}

fn image(predictions: Vec<Prediction>, online_vision: bool) -> CapturedImage {
    CapturedImage {
        uri: "file:///photos/capture.jpg".to_string(),
        time: 1_704_110_400,
        predictions,
        latitude: None,
        longitude: None,
        accuracy: None,
        online_vision,
        error_code: None,
    }
}

pub fn offline_event(predictions: Vec<Prediction>) -> IdentificationEvent {
    IdentificationEvent {
        image: image(predictions, false),
        clicked: false,
        location_permission: LocationPermission::Granted,
    }
}

pub fn online_event() -> IdentificationEvent {
    IdentificationEvent {
        image: image(vec![], true),
        clicked: true,
        location_permission: LocationPermission::Granted,
    }
}

/// Single-result scoring response for a species
pub fn vision_response(taxon_id: i64, combined_score: f64) -> VisionResponse {
    let mut taxon = taxon_record(
        taxon_id,
        Some(format!("https://example.org/{}.jpg", taxon_id)),
    );
    taxon.rank = Some("species".to_string());
    taxon.rank_level = Some(10.0);
    taxon.ancestor_ids = vec![48460, 1, 2, 355675, 3, taxon_id];

    VisionResponse {
        results: vec![VisionResult {
            combined_score,
            taxon,
        }],
        common_ancestor: None,
    }
}

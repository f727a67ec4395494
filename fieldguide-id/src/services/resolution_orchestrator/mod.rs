//! Resolution orchestrator
//!
//! Drives one identification event from raw classifier output to a single
//! `ResolvedTaxon`.
//!
//! # State Progression
//! IDLE → CLASSIFYING → (SPECIES_PATH | ANCESTOR_PATH | NO_MATCH_PATH) → ENRICHING → RESOLVED
//!
//! # Pipelines
//! - `offline`: on-device predictions, classified locally
//! - `online`: image scored by the remote vision service
//!
//! Every phase checks the event's cancellation token first. A superseded
//! event returns `ResolveError::Superseded` and writes nothing further.
//! Photo and location failures degrade at their own boundary; only the
//! remote scorer surfaces errors.

use crate::error::ResolveError;
use crate::models::{
    CapturedImage, IdentificationEvent, ObservationRecord, Resolution, ResolutionState,
    ResolvedTaxon,
};
use crate::services::location::LocationResolver;
use crate::services::photo_fetcher::PhotoFetcher;
use crate::services::seen_ledger::SeenLedger;
use crate::services::vision_auth::VisionAuth;
use crate::services::vision_client::VisionScorer;
use fieldguide_common::events::{EventBus, FieldguideEvent};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

mod offline;
mod online;

/// Default bound on one remote scoring call
pub const DEFAULT_VISION_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-event state passed through every phase
///
/// Owned by a single resolution run; nothing here is shared between events.
#[derive(Debug)]
pub struct ResolutionContext {
    event_id: Uuid,
    cancel_token: CancellationToken,
    trail: Vec<ResolutionState>,
}

impl ResolutionContext {
    pub fn new(event_id: Uuid, cancel_token: CancellationToken) -> Self {
        Self {
            event_id,
            cancel_token,
            trail: vec![ResolutionState::Idle],
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn state(&self) -> ResolutionState {
        self.trail
            .last()
            .copied()
            .unwrap_or(ResolutionState::Idle)
    }

    pub fn trail(&self) -> &[ResolutionState] {
        &self.trail
    }

    pub fn transition_to(&mut self, next: ResolutionState) {
        let current = self.state();
        if !current.can_transition_to(next) {
            tracing::warn!(
                event_id = %self.event_id,
                from = ?current,
                to = ?next,
                "Unexpected resolution state transition"
            );
        }
        tracing::debug!(event_id = %self.event_id, state = ?next, "Resolution state");
        self.trail.push(next);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// `Err(Superseded)` once the event has been replaced or abandoned
    pub fn ensure_live(&self) -> Result<(), ResolveError> {
        if self.is_cancelled() {
            tracing::debug!(
                event_id = %self.event_id,
                state = ?self.state(),
                "Resolution superseded, discarding"
            );
            return Err(ResolveError::Superseded);
        }
        Ok(())
    }

    /// Run `fut` unless the event is cancelled first
    ///
    /// A cancelled event drops `fut` mid-flight.
    pub async fn run_cancellable<F, T>(&self, fut: F) -> Result<T, ResolveError>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => {
                tracing::debug!(
                    event_id = %self.event_id,
                    state = ?self.state(),
                    "Resolution superseded mid-flight"
                );
                Err(ResolveError::Superseded)
            }
            value = fut => Ok(value),
        }
    }

    fn into_trail(self) -> Vec<ResolutionState> {
        self.trail
    }
}

/// Remote scorer plus the credentials to call it
#[derive(Clone)]
pub struct VisionBackend {
    pub scorer: Arc<dyn VisionScorer>,
    pub auth: VisionAuth,
}

/// Result of one pipeline, before it is wrapped into a `Resolution`
#[derive(Debug)]
pub(crate) struct PathOutcome {
    pub taxon: ResolvedTaxon,
    pub image: CapturedImage,
    pub location_error: Option<i32>,
    pub location_error_code: Option<i32>,
    pub first_sighting: bool,
}

impl PathOutcome {
    fn empty(image: CapturedImage, location_error_code: Option<i32>) -> Self {
        Self {
            taxon: ResolvedTaxon::Empty,
            image,
            location_error: None,
            location_error_code,
            first_sighting: false,
        }
    }
}

/// Resolution orchestrator service
pub struct ResolutionOrchestrator {
    ledger: SeenLedger,
    photos: PhotoFetcher,
    location: LocationResolver,
    event_bus: EventBus,
    vision: Option<VisionBackend>,
    vision_timeout: Duration,
    attach_offline_ancestor_ids: bool,
}

impl ResolutionOrchestrator {
    pub fn new(
        ledger: SeenLedger,
        photos: PhotoFetcher,
        location: LocationResolver,
        event_bus: EventBus,
    ) -> Self {
        Self {
            ledger,
            photos,
            location,
            event_bus,
            vision: None,
            vision_timeout: DEFAULT_VISION_TIMEOUT,
            attach_offline_ancestor_ids: false,
        }
    }

    /// Enable the online pipeline
    pub fn with_vision(mut self, backend: VisionBackend) -> Self {
        self.vision = Some(backend);
        self
    }

    pub fn with_vision_timeout(mut self, timeout: Duration) -> Self {
        self.vision_timeout = timeout;
        self
    }

    /// Use the whole prediction list as an offline species' ancestry
    pub fn with_offline_ancestor_ids(mut self, enabled: bool) -> Self {
        self.attach_offline_ancestor_ids = enabled;
        self
    }

    pub fn has_vision(&self) -> bool {
        self.vision.is_some()
    }

    pub fn ledger(&self) -> &SeenLedger {
        &self.ledger
    }

    /// Resolve one identification event
    ///
    /// Produces exactly one `ResolvedTaxon` (possibly `Empty`) or an error.
    /// `cancel_token` is the event's liveness flag.
    pub async fn resolve(
        &self,
        event_id: Uuid,
        event: &IdentificationEvent,
        cancel_token: &CancellationToken,
    ) -> Result<Resolution, ResolveError> {
        let mut ctx = ResolutionContext::new(event_id, cancel_token.clone());
        ctx.ensure_live()?;

        tracing::info!(
            event_id = %event_id,
            online = event.is_online(),
            predictions = event.image.predictions.len(),
            "Resolving identification event"
        );

        ctx.transition_to(ResolutionState::Classifying);

        let outcome = if event.is_online() {
            self.resolve_online(&mut ctx, event).await?
        } else {
            self.resolve_offline(&mut ctx, event).await?
        };

        ctx.ensure_live()?;
        ctx.transition_to(ResolutionState::Resolved);

        tracing::info!(
            event_id = %event_id,
            kind = outcome.taxon.kind(),
            taxon_id = outcome.taxon.taxon_id(),
            first_sighting = outcome.first_sighting,
            "Identification resolved"
        );

        Ok(Resolution {
            event_id,
            taxon: outcome.taxon,
            image: outcome.image,
            location_error: outcome.location_error,
            location_error_code: outcome.location_error_code,
            first_sighting: outcome.first_sighting,
            trail: ctx.into_trail(),
        })
    }

    /// Ledger lookup; a read failure counts as "not seen"
    ///
    /// The write that follows is idempotent, so a failed read can never
    /// produce a duplicate record.
    async fn lookup_seen_date(&self, taxon_id: i64) -> Option<String> {
        match self.ledger.has_seen(taxon_id).await {
            Ok(record) => record.map(|r| fieldguide_common::time::format_seen_date(r.first_seen_at)),
            Err(e) => {
                tracing::warn!(taxon_id, error = %e, "Seen-taxon lookup failed, treating as unseen");
                None
            }
        }
    }

    /// Persist a first sighting and raise the location advisory if needed
    ///
    /// **Returns:** (recorded, location advisory code)
    async fn record_sighting(
        &self,
        ctx: &ResolutionContext,
        observation: &ObservationRecord,
        image: &CapturedImage,
        location_error: Option<i32>,
    ) -> Result<(bool, Option<i32>), ResolveError> {
        ctx.ensure_live()?;

        let recorded = match self.ledger.record_first_sighting(observation).await {
            Ok(recorded) => recorded,
            Err(e) => {
                tracing::warn!(
                    event_id = %ctx.event_id(),
                    taxon_id = observation.taxon_id,
                    error = %e,
                    "Failed to record first sighting, delivering result anyway"
                );
                false
            }
        };

        let advisory = match location_error {
            Some(code) if recorded && image.latitude.is_none() && code != 0 => {
                self.event_bus.emit_lossy(FieldguideEvent::LocationUnavailable {
                    event_id: ctx.event_id(),
                    error_code: code,
                    timestamp: fieldguide_common::time::now(),
                });
                Some(code)
            }
            _ => None,
        };

        Ok((recorded, advisory))
    }
}

//! Identification slot
//!
//! Holds the one current identification event. Each run (a new submission
//! or a refresh) takes a fresh generation number and cancellation token and
//! cancels the previous run's token. A completion whose generation is no
//! longer current is discarded without touching the slot.
//!
//! Update policy: a resolved taxon replaces the slot's taxon only when there
//! was none, or when the new taxon has an id different from the old one.

use crate::error::ResolveError;
use crate::models::{IdentificationEvent, Resolution, ResolvedTaxon};
use crate::services::resolution_orchestrator::ResolutionOrchestrator;
use fieldguide_common::events::{EventBus, FieldguideEvent};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Whether `new` should replace `previous` as the slot's taxon
pub fn should_replace(previous: Option<&ResolvedTaxon>, new: &ResolvedTaxon) -> bool {
    match previous {
        None => true,
        Some(previous) => match new.taxon_id() {
            Some(id) => previous.taxon_id() != Some(id),
            None => false,
        },
    }
}

/// Error summary exposed in snapshots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotError {
    pub code: String,
    pub message: String,
    pub retry_in_hours: Option<i64>,
}

impl From<&ResolveError> for SlotError {
    fn from(err: &ResolveError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            retry_in_hours: err.retry_in_hours(),
        }
    }
}

/// Read-only view of the slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSnapshot {
    pub event_id: Option<Uuid>,
    pub generation: u64,
    pub in_flight: bool,
    pub event: Option<IdentificationEvent>,
    pub taxon: Option<ResolvedTaxon>,
    pub resolution: Option<Resolution>,
    pub error: Option<SlotError>,
}

#[derive(Debug)]
struct CurrentEvent {
    id: Uuid,
    generation: u64,
    event: IdentificationEvent,
    token: CancellationToken,
    in_flight: bool,
    taxon: Option<ResolvedTaxon>,
    resolution: Option<Resolution>,
    error: Option<ResolveError>,
}

/// A run handed to the orchestrator
struct RunTicket {
    id: Uuid,
    generation: u64,
    event: IdentificationEvent,
    token: CancellationToken,
}

pub struct IdentificationSlot {
    orchestrator: Arc<ResolutionOrchestrator>,
    event_bus: EventBus,
    generation: AtomicU64,
    current: RwLock<Option<CurrentEvent>>,
    last_error: RwLock<Option<String>>,
}

impl IdentificationSlot {
    pub fn new(orchestrator: Arc<ResolutionOrchestrator>, event_bus: EventBus) -> Self {
        Self {
            orchestrator,
            event_bus,
            generation: AtomicU64::new(0),
            current: RwLock::new(None),
            last_error: RwLock::new(None),
        }
    }

    /// Message of the most recent failed run, background runs included
    ///
    /// Outlives the event it came from; superseded runs never set it.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub fn orchestrator(&self) -> &ResolutionOrchestrator {
        &self.orchestrator
    }

    /// Latest generation handed out
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Replace the current event and resolve it, waiting for the result
    pub async fn identify(&self, event: IdentificationEvent) -> Result<Resolution, ResolveError> {
        let ticket = self.begin(event).await;
        self.run(ticket).await
    }

    /// Replace the current event and resolve it in the background
    ///
    /// The outcome arrives on the event bus.
    pub async fn submit(self: &Arc<Self>, event: IdentificationEvent) -> Uuid {
        let ticket = self.begin(event).await;
        let event_id = ticket.id;

        let slot = Arc::clone(self);
        tokio::spawn(async move {
            let _ = slot.run(ticket).await;
        });

        event_id
    }

    /// Re-resolve the current event
    ///
    /// **Returns:** None if the slot is empty
    pub async fn refresh(&self) -> Option<Result<Resolution, ResolveError>> {
        let ticket = {
            let mut current = self.current.write().await;
            let current = current.as_mut()?;

            current.token.cancel();
            current.token = CancellationToken::new();
            current.generation = self.next_generation();
            current.in_flight = true;

            tracing::info!(
                event_id = %current.id,
                generation = current.generation,
                "Refreshing identification"
            );

            RunTicket {
                id: current.id,
                generation: current.generation,
                event: current.event.clone(),
                token: current.token.clone(),
            }
        };

        Some(self.run(ticket).await)
    }

    /// Drop the current event, cancelling any in-flight resolution
    ///
    /// **Returns:** the abandoned event's id
    pub async fn abandon(&self) -> Option<Uuid> {
        let previous = self.current.write().await.take()?;
        previous.token.cancel();
        self.generation.fetch_add(1, Ordering::SeqCst);

        tracing::info!(event_id = %previous.id, "Identification abandoned");
        self.event_bus
            .emit_lossy(FieldguideEvent::IdentificationSuperseded {
                event_id: previous.id,
                timestamp: fieldguide_common::time::now(),
            });

        Some(previous.id)
    }

    pub async fn snapshot(&self) -> SlotSnapshot {
        let current = self.current.read().await;
        match current.as_ref() {
            Some(c) => SlotSnapshot {
                event_id: Some(c.id),
                generation: c.generation,
                in_flight: c.in_flight,
                event: Some(c.event.clone()),
                taxon: c.taxon.clone(),
                resolution: c.resolution.clone(),
                error: c.error.as_ref().map(SlotError::from),
            },
            None => SlotSnapshot {
                event_id: None,
                generation: self.current_generation(),
                in_flight: false,
                event: None,
                taxon: None,
                resolution: None,
                error: None,
            },
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn begin(&self, event: IdentificationEvent) -> RunTicket {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        let online = event.is_online();

        let (previous, generation) = {
            let mut current = self.current.write().await;
            let generation = self.next_generation();
            let previous = current.replace(CurrentEvent {
                id,
                generation,
                event: event.clone(),
                token: token.clone(),
                in_flight: true,
                taxon: None,
                resolution: None,
                error: None,
            });
            (previous, generation)
        };

        tracing::info!(event_id = %id, generation, online, "Identification started");

        if let Some(previous) = previous {
            previous.token.cancel();
            if previous.in_flight {
                self.event_bus
                    .emit_lossy(FieldguideEvent::IdentificationSuperseded {
                        event_id: previous.id,
                        timestamp: fieldguide_common::time::now(),
                    });
            }
        }

        self.event_bus
            .emit_lossy(FieldguideEvent::IdentificationStarted {
                event_id: id,
                online,
                timestamp: fieldguide_common::time::now(),
            });

        RunTicket {
            id,
            generation,
            event,
            token,
        }
    }

    async fn run(&self, ticket: RunTicket) -> Result<Resolution, ResolveError> {
        let result = self
            .orchestrator
            .resolve(ticket.id, &ticket.event, &ticket.token)
            .await;
        self.apply(ticket.generation, result).await
    }

    /// Apply a completed run if it is still current
    async fn apply(
        &self,
        generation: u64,
        result: Result<Resolution, ResolveError>,
    ) -> Result<Resolution, ResolveError> {
        let mut guard = self.current.write().await;

        let current = match guard.as_mut() {
            Some(current) if current.generation == generation && !current.token.is_cancelled() => {
                current
            }
            _ => {
                tracing::debug!(generation, "Discarding stale resolution");
                return Err(ResolveError::Superseded);
            }
        };

        current.in_flight = false;

        match result {
            Ok(resolution) => {
                if should_replace(current.taxon.as_ref(), &resolution.taxon) {
                    current.taxon = Some(resolution.taxon.clone());
                    current.resolution = Some(resolution.clone());
                    current.error = None;

                    self.event_bus.emit_lossy(FieldguideEvent::TaxonResolved {
                        event_id: resolution.event_id,
                        taxon: resolution.taxon.clone(),
                        first_sighting: resolution.first_sighting,
                        timestamp: fieldguide_common::time::now(),
                    });
                } else {
                    tracing::debug!(
                        event_id = %current.id,
                        taxon_id = resolution.taxon.taxon_id(),
                        "Resolved taxon unchanged, keeping current result"
                    );
                }
                Ok(resolution)
            }
            Err(ResolveError::Superseded) => Err(ResolveError::Superseded),
            Err(err) => {
                tracing::warn!(event_id = %current.id, code = err.code(), error = %err, "Identification failed");
                current.error = Some(err.clone());
                *self.last_error.write().await = Some(err.to_string());

                self.event_bus
                    .emit_lossy(FieldguideEvent::IdentificationFailed {
                        event_id: current.id,
                        code: err.code().to_string(),
                        message: err.to_string(),
                        retry_in_hours: err.retry_in_hours(),
                        timestamp: fieldguide_common::time::now(),
                    });
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(id: i64) -> ResolvedTaxon {
        ResolvedTaxon::Species {
            taxon_id: id,
            scientific_name: format!("taxon {}", id),
            photo_url: None,
            seen_date: None,
        }
    }

    #[test]
    fn test_first_result_always_applies() {
        assert!(should_replace(None, &species(5)));
        assert!(should_replace(None, &ResolvedTaxon::Empty));
    }

    #[test]
    fn test_same_taxon_not_replaced() {
        assert!(!should_replace(Some(&species(5)), &species(5)));
    }

    #[test]
    fn test_different_taxon_replaced() {
        assert!(should_replace(Some(&species(5)), &species(7)));
        assert!(should_replace(Some(&ResolvedTaxon::Empty), &species(7)));
    }

    #[test]
    fn test_empty_never_replaces_existing() {
        assert!(!should_replace(Some(&species(5)), &ResolvedTaxon::Empty));
        assert!(!should_replace(Some(&ResolvedTaxon::Empty), &ResolvedTaxon::Empty));
    }

    #[test]
    fn test_slot_error_from_downtime() {
        let err = SlotError::from(&ResolveError::ServiceDowntime { hours: 3 });
        assert_eq!(err.code, "SERVICE_DOWNTIME");
        assert_eq!(err.retry_in_hours, Some(3));
    }
}

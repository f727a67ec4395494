//! Event types for the Fieldguide event system
//!
//! Provides shared event definitions and the EventBus used as the
//! update-notification channel for identification results.

mod taxon_types;

pub use taxon_types::ResolvedTaxon;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Fieldguide event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldguideEvent {
    /// An identification event entered resolution
    IdentificationStarted {
        event_id: Uuid,
        /// Whether the remote vision service scores this event
        online: bool,
        timestamp: DateTime<Utc>,
    },

    /// A resolved taxon was applied to the current event
    ///
    /// Only emitted for results that survive the liveness check and the
    /// update policy, so subscribers never see stale or redundant results.
    TaxonResolved {
        event_id: Uuid,
        taxon: ResolvedTaxon,
        /// True when this resolution recorded a first sighting
        first_sighting: bool,
        timestamp: DateTime<Utc>,
    },

    /// Resolution ended in a user-visible error
    IdentificationFailed {
        event_id: Uuid,
        /// Machine-readable error code (e.g. "SERVICE_DOWNTIME")
        code: String,
        message: String,
        /// Hours until the remote service returns, for downtime errors
        retry_in_hours: Option<i64>,
        timestamp: DateTime<Utc>,
    },

    /// A newer event (or an abandon request) replaced this one
    IdentificationSuperseded {
        event_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A taxon was seen for the first time and persisted
    ///
    /// Fire-and-forget hook for downstream progress/challenge recalculation.
    SightingRecorded {
        taxon_id: i64,
        iconic_group: i64,
        timestamp: DateTime<Utc>,
    },

    /// First sighting recorded without coordinates
    ///
    /// Advisory only: the identification itself succeeded.
    LocationUnavailable {
        event_id: Uuid,
        error_code: i32,
        timestamp: DateTime<Utc>,
    },
}

impl FieldguideEvent {
    /// Event type name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            FieldguideEvent::IdentificationStarted { .. } => "IdentificationStarted",
            FieldguideEvent::TaxonResolved { .. } => "TaxonResolved",
            FieldguideEvent::IdentificationFailed { .. } => "IdentificationFailed",
            FieldguideEvent::IdentificationSuperseded { .. } => "IdentificationSuperseded",
            FieldguideEvent::SightingRecorded { .. } => "SightingRecorded",
            FieldguideEvent::LocationUnavailable { .. } => "LocationUnavailable",
        }
    }
}

/// Broadcast bus for Fieldguide events
///
/// Cloning is cheap; all clones share one channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FieldguideEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldguide_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<FieldguideEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: FieldguideEvent,
    ) -> Result<usize, broadcast::error::SendError<FieldguideEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: FieldguideEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        let event_id = Uuid::new_v4();
        let count = bus
            .emit(FieldguideEvent::IdentificationSuperseded {
                event_id,
                timestamp: Utc::now(),
            })
            .unwrap();
        assert_eq!(count, 1);

        match rx.recv().await.unwrap() {
            FieldguideEvent::IdentificationSuperseded { event_id: got, .. } => {
                assert_eq!(got, event_id)
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus
            .emit(FieldguideEvent::SightingRecorded {
                taxon_id: 1,
                iconic_group: 1,
                timestamp: Utc::now(),
            })
            .is_err());

        // Lossy emit never fails
        bus.emit_lossy(FieldguideEvent::SightingRecorded {
            taxon_id: 1,
            iconic_group: 1,
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = FieldguideEvent::TaxonResolved {
            event_id: Uuid::nil(),
            taxon: ResolvedTaxon::Empty,
            first_sighting: false,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TaxonResolved");
        assert_eq!(json["taxon"]["kind"], "empty");
        assert_eq!(event.event_type(), "TaxonResolved");
    }
}

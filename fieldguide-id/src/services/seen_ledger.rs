//! Seen-taxon ledger
//!
//! Answers "has this taxon been seen, and when" and records first sightings.
//! The write is an atomic check-and-insert keyed by taxon id, so concurrent
//! resolutions of the same taxon produce at most one record.

use crate::db::seen_taxa;
use crate::models::{ObservationRecord, SeenRecord};
use crate::utils::db_retry::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};
use fieldguide_common::events::{EventBus, FieldguideEvent};
use fieldguide_common::Result;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SeenLedger {
    db: SqlitePool,
    event_bus: EventBus,
}

impl SeenLedger {
    pub fn new(db: SqlitePool, event_bus: EventBus) -> Self {
        Self { db, event_bus }
    }

    /// First sighting of `taxon_id`, if any
    pub async fn has_seen(&self, taxon_id: i64) -> Result<Option<SeenRecord>> {
        seen_taxa::find_first_seen(&self.db, taxon_id).await
    }

    /// Persist the first sighting described by `observation`
    ///
    /// **Returns:** true if this call recorded the sighting; false if another
    /// resolution got there first. Emits `SightingRecorded` only when true.
    pub async fn record_first_sighting(&self, observation: &ObservationRecord) -> Result<bool> {
        let record = SeenRecord {
            taxon_id: observation.taxon_id,
            first_seen_at: fieldguide_common::time::now(),
        };

        let inserted = retry_on_lock("first sighting", DEFAULT_MAX_LOCK_WAIT_MS, || {
            seen_taxa::insert_first_sighting(&self.db, &record, Some(observation))
        })
        .await?;

        if inserted {
            tracing::info!(
                taxon_id = observation.taxon_id,
                name = %observation.name,
                iconic_group = observation.iconic_group,
                "First sighting recorded"
            );
            self.event_bus.emit_lossy(FieldguideEvent::SightingRecorded {
                taxon_id: observation.taxon_id,
                iconic_group: observation.iconic_group,
                timestamp: record.first_seen_at,
            });
        } else {
            tracing::debug!(
                taxon_id = observation.taxon_id,
                "Taxon already recorded by a concurrent resolution"
            );
        }

        Ok(inserted)
    }
}

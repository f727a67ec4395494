//! Resolution state machine and outcome
//!
//! # State Progression
//! IDLE → CLASSIFYING → (SPECIES_PATH | ANCESTOR_PATH | NO_MATCH_PATH) → ENRICHING → RESOLVED
//!
//! NO_MATCH_PATH skips ENRICHING: there is no taxon to enrich.

use super::event::CapturedImage;
use fieldguide_common::events::ResolvedTaxon;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resolution workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionState {
    /// Event accepted, nothing run yet
    Idle,
    /// Predictions being classified (or scored remotely)
    Classifying,
    /// Species-level match found
    SpeciesPath,
    /// Coarser-rank match found
    AncestorPath,
    /// Nothing cleared the thresholds
    NoMatchPath,
    /// Photo, ledger and location lookups in flight
    Enriching,
    /// Result ready
    Resolved,
}

impl ResolutionState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: ResolutionState) -> bool {
        use ResolutionState::*;
        matches!(
            (self, next),
            (Idle, Classifying)
                | (Classifying, SpeciesPath)
                | (Classifying, AncestorPath)
                | (Classifying, NoMatchPath)
                | (SpeciesPath, Enriching)
                | (AncestorPath, Enriching)
                | (Enriching, Resolved)
                | (NoMatchPath, Resolved)
        )
    }
}

/// Outcome of one resolution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub event_id: Uuid,
    pub taxon: ResolvedTaxon,
    /// The event's image, with coordinates attached when they were available
    pub image: CapturedImage,
    /// Location error code to surface as a non-blocking advisory
    ///
    /// Only set on a first sighting recorded without coordinates.
    pub location_error: Option<i32>,
    /// Why the image has no coordinates, whatever path the run took
    pub location_error_code: Option<i32>,
    /// This run recorded the taxon's first sighting
    pub first_sighting: bool,
    /// States visited, in order
    pub trail: Vec<ResolutionState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use ResolutionState::*;
        assert!(Idle.can_transition_to(Classifying));
        assert!(Classifying.can_transition_to(AncestorPath));
        assert!(SpeciesPath.can_transition_to(Enriching));
        assert!(NoMatchPath.can_transition_to(Resolved));

        assert!(!Idle.can_transition_to(Resolved));
        assert!(!NoMatchPath.can_transition_to(Enriching));
        assert!(!Resolved.can_transition_to(Classifying));
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ResolutionState::NoMatchPath).unwrap();
        assert_eq!(json, "\"NO_MATCH_PATH\"");
    }
}

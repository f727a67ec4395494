//! Resolved taxon payload shared by the identification service and its events

use serde::{Deserialize, Serialize};

/// Outcome of resolving one identification event
///
/// Each variant carries only the fields valid for it. `Empty` is an explicit
/// "looked and found nothing" result, distinct from "not resolved yet"
/// (which is the absence of a `ResolvedTaxon` altogether).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedTaxon {
    /// Species-level match
    Species {
        taxon_id: i64,
        scientific_name: String,
        photo_url: Option<String>,
        /// Display date of the first sighting; `None` on a first sighting
        seen_date: Option<String>,
    },
    /// Match at a coarser, display-worthy rank
    Ancestor {
        taxon_id: i64,
        scientific_name: String,
        rank: i32,
        photo_url: Option<String>,
    },
    /// Nothing cleared the decision thresholds
    Empty,
}

impl ResolvedTaxon {
    /// Taxon id, absent for `Empty`
    pub fn taxon_id(&self) -> Option<i64> {
        match self {
            ResolvedTaxon::Species { taxon_id, .. } | ResolvedTaxon::Ancestor { taxon_id, .. } => {
                Some(*taxon_id)
            }
            ResolvedTaxon::Empty => None,
        }
    }

    pub fn scientific_name(&self) -> Option<&str> {
        match self {
            ResolvedTaxon::Species { scientific_name, .. }
            | ResolvedTaxon::Ancestor { scientific_name, .. } => Some(scientific_name),
            ResolvedTaxon::Empty => None,
        }
    }

    pub fn photo_url(&self) -> Option<&str> {
        match self {
            ResolvedTaxon::Species { photo_url, .. } | ResolvedTaxon::Ancestor { photo_url, .. } => {
                photo_url.as_deref()
            }
            ResolvedTaxon::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ResolvedTaxon::Empty)
    }

    /// Variant name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedTaxon::Species { .. } => "species",
            ResolvedTaxon::Ancestor { .. } => "ancestor",
            ResolvedTaxon::Empty => "empty",
        }
    }
}

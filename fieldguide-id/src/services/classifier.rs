//! Prediction classifier
//!
//! Pure decision rules over a ranked prediction list. No I/O.
//!
//! - Species: first prediction (input order) with rank 10 and score above
//!   the threshold.
//! - Ancestor: predictions reordered finest rank first; the first one above
//!   the threshold, unless it is the root (rank 100).
//! - Otherwise no match.

use crate::models::{Prediction, PredictionSet};
use crate::taxonomy::rank;

/// Score a prediction must exceed to count as a match (on-device scale)
pub const PREDICTION_THRESHOLD: f64 = 0.7;

/// Combined score a remote species result must exceed (remote scale, 0-100)
///
/// Independent of `PREDICTION_THRESHOLD`; the two services score on
/// different scales.
pub const COMBINED_SCORE_THRESHOLD: f64 = 85.0;

/// Outcome of classifying a prediction set
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Species(Prediction),
    Ancestor(Prediction),
    NoMatch,
}

impl Classification {
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Classification::Species(p) | Classification::Ancestor(p) => Some(p),
            Classification::NoMatch => None,
        }
    }
}

/// Classify `predictions` against `threshold`
pub fn classify(predictions: &PredictionSet, threshold: f64) -> Classification {
    if let Some(species) = find_species(predictions.predictions(), threshold) {
        return Classification::Species(species.clone());
    }

    match find_ancestor(predictions.predictions(), threshold) {
        Some(ancestor) => Classification::Ancestor(ancestor.clone()),
        None => Classification::NoMatch,
    }
}

/// First species-rank prediction above `threshold`, in input order
pub fn find_species(predictions: &[Prediction], threshold: f64) -> Option<&Prediction> {
    predictions
        .iter()
        .find(|p| p.rank == rank::SPECIES && p.score > threshold)
}

/// Finest-rank prediction above `threshold`, rejecting a root-only match
///
/// Stable sort: predictions sharing a rank keep their input order.
pub fn find_ancestor(predictions: &[Prediction], threshold: f64) -> Option<&Prediction> {
    let mut by_rank: Vec<&Prediction> = predictions.iter().collect();
    by_rank.sort_by_key(|p| p.rank);

    by_rank
        .into_iter()
        .find(|p| p.score > threshold)
        .filter(|p| p.rank != rank::ROOT)
}

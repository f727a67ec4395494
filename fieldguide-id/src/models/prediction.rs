//! Classifier predictions
//!
//! A prediction is one ranked classifier output. Rank values follow the
//! taxonomic rank-level scale: 10 = species up to 100 = root.

use serde::{Deserialize, Serialize};

/// One classifier output. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub taxon_id: i64,
    pub name: String,
    /// Rank level (10 = species .. 100 = root)
    pub rank: i32,
    /// Confidence in [0, 1]
    pub score: f64,
    /// Ancestor lineage, when the model supplies it
    #[serde(default)]
    pub ancestor_ids: Vec<i64>,
}

/// Which classifier produced a prediction set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// On-device model
    OnDevice,
    /// Remote vision service
    RemoteVision,
}

/// Ordered predictions for a single capture event
///
/// Order is the classifier's output order and is significant: the first
/// qualifying species prediction wins.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSet {
    predictions: Vec<Prediction>,
    source: PredictionSource,
}

impl PredictionSet {
    pub fn new(predictions: Vec<Prediction>, source: PredictionSource) -> Self {
        Self {
            predictions,
            source,
        }
    }

    pub fn on_device(predictions: Vec<Prediction>) -> Self {
        Self::new(predictions, PredictionSource::OnDevice)
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn source(&self) -> PredictionSource {
        self.source
    }

    pub fn is_online(&self) -> bool {
        self.source == PredictionSource::RemoteVision
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    /// Taxon ids of every prediction, ascending
    ///
    /// The on-device model emits one prediction per rank along a single
    /// lineage, so these ids double as the matched species' ancestry when
    /// the model leaves `ancestor_ids` empty.
    pub fn lineage_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.predictions.iter().map(|p| p.taxon_id).collect();
        ids.sort_unstable();
        ids
    }
}

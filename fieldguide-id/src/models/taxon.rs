//! Taxon records returned by the remote services

use crate::taxonomy::RankedTaxon;
use serde::{Deserialize, Serialize};

/// Photo attached to a remote taxon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonPhoto {
    pub medium_url: Option<String>,
}

/// Remote taxon as served by the taxa and vision endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonRecord {
    pub id: i64,
    pub name: String,
    /// Rank name, e.g. "species"
    #[serde(default)]
    pub rank: Option<String>,
    /// Rank level; may be fractional for intermediate ranks
    #[serde(default)]
    pub rank_level: Option<f64>,
    #[serde(default)]
    pub default_photo: Option<TaxonPhoto>,
    #[serde(default)]
    pub ancestor_ids: Vec<i64>,
    /// Full ancestor chain (vision results only)
    #[serde(default, alias = "ancestorTaxa")]
    pub ancestors: Vec<TaxonRecord>,
    #[serde(default)]
    pub iconic_taxon_id: Option<i64>,
}

impl TaxonRecord {
    pub fn is_species(&self) -> bool {
        self.rank.as_deref() == Some("species")
    }

    /// Medium photo URL, if the taxon has one
    pub fn photo_url(&self) -> Option<String> {
        self.default_photo
            .as_ref()
            .and_then(|photo| photo.medium_url.clone())
    }
}

impl RankedTaxon for TaxonRecord {
    fn rank_level(&self) -> f64 {
        // Unknown level never equals a primary rank
        self.rank_level.unwrap_or(f64::NAN)
    }
}

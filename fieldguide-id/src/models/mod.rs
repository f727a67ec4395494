//! Data models for fieldguide-id
//!
//! - Classifier output (predictions) and the identification event wrapping it
//! - Persisted sighting/observation records
//! - Resolution outcome and its state machine
//! - Taxon records served by the remote services

pub mod event;
pub mod observation;
pub mod prediction;
pub mod resolution;
pub mod taxon;

pub use event::{CapturedImage, Coordinates, IdentificationEvent, LocationPermission};
pub use fieldguide_common::events::ResolvedTaxon;
pub use observation::{ObservationRecord, SeenRecord};
pub use prediction::{Prediction, PredictionSet, PredictionSource};
pub use resolution::{Resolution, ResolutionState};
pub use taxon::{TaxonPhoto, TaxonRecord};

//! Service modules for identification resolution
//!
//! Leaf-first:
//! - `classifier`: pure species/ancestor/no-match decision
//! - `taxa_client`, `photo_fetcher`: taxon metadata and bounded photo lookup
//! - `vision_client`, `vision_auth`: remote scorer and its signed tokens
//! - `location`: best-effort device coordinates
//! - `seen_ledger`: first-sighting bookkeeping
//! - `resolution_orchestrator`: per-event state machine
//! - `identification_slot`: current event, supersede and update policy

pub mod classifier;
pub mod identification_slot;
pub mod location;
pub mod photo_fetcher;
pub mod resolution_orchestrator;
pub mod seen_ledger;
pub mod taxa_client;
pub mod vision_auth;
pub mod vision_client;

pub use classifier::{classify, Classification, COMBINED_SCORE_THRESHOLD, PREDICTION_THRESHOLD};
pub use identification_slot::{IdentificationSlot, SlotSnapshot};
pub use location::{ConfiguredLocationProvider, GeolocationProvider, LocationError, LocationResolver};
pub use photo_fetcher::{PhotoFetcher, PHOTO_TIMEOUT_MS};
pub use resolution_orchestrator::{ResolutionContext, ResolutionOrchestrator, VisionBackend};
pub use seen_ledger::SeenLedger;
pub use taxa_client::{TaxaClient, TaxaError, TaxonMetadataSource};
pub use vision_auth::VisionAuth;
pub use vision_client::{UploadPayload, VisionClient, VisionError, VisionResponse, VisionScorer};

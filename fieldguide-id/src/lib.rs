//! fieldguide-id library interface
//!
//! Species-identification result resolution: turns classifier output into a
//! single resolved taxon, records first sightings and enriches results with
//! photos and location. Exposed as a library for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod taxonomy;
pub mod utils;

pub use crate::error::{ApiError, ApiResult, ResolveError};

use axum::Router;
use chrono::{DateTime, Utc};
use fieldguide_common::config::TomlConfig;
use fieldguide_common::events::EventBus;
use services::{
    ConfiguredLocationProvider, IdentificationSlot, LocationResolver, PhotoFetcher,
    ResolutionOrchestrator, SeenLedger, TaxaClient, VisionAuth, VisionBackend, VisionClient,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// The current identification event
    pub slot: Arc<IdentificationSlot>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, slot: Arc<IdentificationSlot>) -> Self {
        Self {
            db,
            event_bus,
            slot,
            startup_time: Utc::now(),
        }
    }
}

/// Build the resolution orchestrator from configuration
///
/// `vision_secret` of `None` leaves the online pipeline disabled; online
/// events then fail with `OnlineVisionUnavailable`.
pub fn build_orchestrator(
    db: SqlitePool,
    event_bus: EventBus,
    config: &TomlConfig,
    vision_secret: Option<String>,
) -> anyhow::Result<ResolutionOrchestrator> {
    let taxa = TaxaClient::new(config.taxa.base_url.clone())?;
    let location = ConfiguredLocationProvider::from_config(&config.location);

    let mut orchestrator = ResolutionOrchestrator::new(
        SeenLedger::new(db, event_bus.clone()),
        PhotoFetcher::new(Arc::new(taxa)),
        LocationResolver::new(Arc::new(location)),
        event_bus,
    )
    .with_vision_timeout(Duration::from_secs(config.vision.timeout_secs))
    .with_offline_ancestor_ids(config.offline.attach_ancestor_ids);

    match vision_secret {
        Some(secret) => {
            let client = VisionClient::new(config.vision.base_url.clone())?;
            orchestrator = orchestrator.with_vision(VisionBackend {
                scorer: Arc::new(client),
                auth: VisionAuth::new(secret),
            });
            tracing::info!(base_url = %config.vision.base_url, "Online vision enabled");
        }
        None => tracing::warn!("Online vision disabled: no vision secret configured"),
    }

    Ok(orchestrator)
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::identify_routes())
        .merge(api::seen_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Seen-taxon lookup endpoint

use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SeenResponse {
    pub taxon_id: i64,
    pub seen: bool,
    pub first_seen_at: Option<DateTime<Utc>>,
    /// Display date, e.g. "Jan 1, 2024"
    pub seen_date: Option<String>,
}

/// GET /seen/:taxon_id
pub async fn get_seen(
    State(state): State<AppState>,
    Path(taxon_id): Path<i64>,
) -> ApiResult<Json<SeenResponse>> {
    if taxon_id <= 0 {
        return Err(ApiError::BadRequest(format!("Invalid taxon id {}", taxon_id)));
    }

    let record = state
        .slot
        .orchestrator()
        .ledger()
        .has_seen(taxon_id)
        .await?;

    Ok(Json(SeenResponse {
        taxon_id,
        seen: record.is_some(),
        first_seen_at: record.as_ref().map(|r| r.first_seen_at),
        seen_date: record
            .as_ref()
            .map(|r| fieldguide_common::time::format_seen_date(r.first_seen_at)),
    }))
}

pub fn seen_routes() -> Router<AppState> {
    Router::new().route("/seen/:taxon_id", get(get_seen))
}

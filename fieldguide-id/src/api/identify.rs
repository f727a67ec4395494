//! Identification endpoints
//!
//! - POST /identify: resolve an event and wait for the result
//! - POST /identify/submit: resolve in the background, result over SSE
//! - GET /identify/current: snapshot of the current event
//! - POST /identify/current/refresh: re-resolve the current event
//! - DELETE /identify/current: abandon the current event

use crate::error::ResolveError;
use crate::models::{IdentificationEvent, Resolution};
use crate::services::SlotSnapshot;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

/// Reject events the pipeline cannot run
///
/// Online scoring requires the user to have confirmed the photo; an event
/// without an image source came from a denied gallery/camera permission.
pub fn validate_event(event: &IdentificationEvent) -> ApiResult<()> {
    if event.image.uri.trim().is_empty() {
        return Err(ResolveError::PermissionDenied("No usable image source".to_string()).into());
    }

    if event.is_online() && !event.clicked {
        return Err(ApiError::BadRequest(
            "Online identification requires a confirmed photo (clicked = true)".to_string(),
        ));
    }

    Ok(())
}

/// POST /identify
pub async fn identify(
    State(state): State<AppState>,
    Json(event): Json<IdentificationEvent>,
) -> ApiResult<Json<Resolution>> {
    validate_event(&event)?;

    let resolution = state.slot.identify(event).await?;
    Ok(Json(resolution))
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub event_id: Uuid,
}

/// POST /identify/submit
pub async fn submit(
    State(state): State<AppState>,
    Json(event): Json<IdentificationEvent>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    validate_event(&event)?;

    let event_id = state.slot.submit(event).await;
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { event_id })))
}

/// GET /identify/current
pub async fn current(State(state): State<AppState>) -> Json<SlotSnapshot> {
    Json(state.slot.snapshot().await)
}

/// POST /identify/current/refresh
pub async fn refresh(State(state): State<AppState>) -> ApiResult<Json<Resolution>> {
    match state.slot.refresh().await {
        Some(result) => Ok(Json(result?)),
        None => Err(ApiError::NotFound("No current identification".to_string())),
    }
}

#[derive(Debug, Serialize)]
pub struct AbandonResponse {
    pub event_id: Uuid,
}

/// DELETE /identify/current
pub async fn abandon(State(state): State<AppState>) -> ApiResult<Json<AbandonResponse>> {
    state
        .slot
        .abandon()
        .await
        .map(|event_id| Json(AbandonResponse { event_id }))
        .ok_or_else(|| ApiError::NotFound("No current identification".to_string()))
}

pub fn identify_routes() -> Router<AppState> {
    Router::new()
        .route("/identify", post(identify))
        .route("/identify/submit", post(submit))
        .route("/identify/current", get(current).delete(abandon))
        .route("/identify/current/refresh", post(refresh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CapturedImage, LocationPermission};

    fn event(uri: &str, online: bool, clicked: bool) -> IdentificationEvent {
        IdentificationEvent {
            image: CapturedImage {
                uri: uri.to_string(),
                time: 0,
                predictions: vec![],
                latitude: None,
                longitude: None,
                accuracy: None,
                online_vision: online,
                error_code: None,
            },
            clicked,
            location_permission: LocationPermission::Granted,
        }
    }

    #[test]
    fn test_offline_needs_no_click() {
        assert!(validate_event(&event("file:///a.jpg", false, false)).is_ok());
    }

    #[test]
    fn test_online_requires_click() {
        assert!(matches!(
            validate_event(&event("file:///a.jpg", true, false)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(validate_event(&event("file:///a.jpg", true, true)).is_ok());
    }

    #[test]
    fn test_missing_image_source() {
        assert!(matches!(
            validate_event(&event("  ", false, false)),
            Err(ApiError::Resolve(ResolveError::PermissionDenied(_)))
        ));
    }
}

//! Error types for fieldguide-id
//!
//! Two layers:
//! - `ResolveError`: the user-visible outcomes of a failed resolution. Photo
//!   and location failures never appear here; they degrade to `None` or an
//!   advisory code at their own boundary.
//! - `ApiError`: HTTP mapping for handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Resolution failure surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Remote scorer gave no usable response (retryable)
    #[error("Online vision unavailable: {0}")]
    OnlineVisionUnavailable(String),

    /// Remote scorer answered 503 with a retry-after window
    #[error("Vision service down, retry in {hours} hours")]
    ServiceDowntime { hours: i64 },

    /// A newer event replaced this one before it finished
    #[error("Identification superseded by a newer event")]
    Superseded,

    /// Capture side supplied no usable image source
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl ResolveError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::OnlineVisionUnavailable(_) => "ONLINE_VISION_UNAVAILABLE",
            ResolveError::ServiceDowntime { .. } => "SERVICE_DOWNTIME",
            ResolveError::Superseded => "SUPERSEDED",
            ResolveError::PermissionDenied(_) => "PERMISSION_DENIED",
        }
    }

    /// Hours until the vision service returns, for downtime errors
    pub fn retry_in_hours(&self) -> Option<i64> {
        match self {
            ResolveError::ServiceDowntime { hours } => Some(*hours),
            _ => None,
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Resolution failure
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Ledger or configuration failure
    #[error("Ledger error: {0}")]
    Common(#[from] fieldguide_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut retry_in_hours = None;

        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Resolve(ref err) => {
                retry_in_hours = err.retry_in_hours();
                let status = match err {
                    ResolveError::OnlineVisionUnavailable(_) => StatusCode::BAD_GATEWAY,
                    ResolveError::ServiceDowntime { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    ResolveError::Superseded => StatusCode::CONFLICT,
                    ResolveError::PermissionDenied(_) => StatusCode::BAD_REQUEST,
                };
                (status, err.code(), err.to_string())
            }
            ApiError::Common(ref err) if err.is_transient() => {
                (StatusCode::SERVICE_UNAVAILABLE, "LEDGER_BUSY", err.to_string())
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "LEDGER_ERROR",
                err.to_string(),
            ),
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let Some(hours) = retry_in_hours {
            error["retry_in_hours"] = json!(hours);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downtime_code_and_hours() {
        let err = ResolveError::ServiceDowntime { hours: 3 };
        assert_eq!(err.code(), "SERVICE_DOWNTIME");
        assert_eq!(err.retry_in_hours(), Some(3));
        assert_eq!(err.to_string(), "Vision service down, retry in 3 hours");
    }

    #[test]
    fn test_status_mapping() {
        let response = ApiError::from(ResolveError::ServiceDowntime { hours: 2 }).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response =
            ApiError::from(ResolveError::OnlineVisionUnavailable("timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = ApiError::from(ResolveError::Superseded).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_ledger_busy_is_unavailable() {
        let busy = fieldguide_common::Error::LedgerBusy {
            operation: "first sighting".to_string(),
            attempts: 4,
            waited_ms: 5001,
        };
        let response = ApiError::from(busy).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let corrupt = fieldguide_common::Error::corrupt("observations", "abc", "bad uuid");
        let response = ApiError::from(corrupt).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Location enrichment
//!
//! Best-effort attachment of device coordinates to an image. Never fails:
//! problems come back as a numeric error code the caller can turn into a
//! "location unavailable" advisory.

use crate::models::{CapturedImage, Coordinates, LocationPermission};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Geolocation error codes
pub mod codes {
    pub const PERMISSION_DENIED: i32 = 1;
    pub const POSITION_UNAVAILABLE: i32 = 2;
    pub const TIMEOUT: i32 = 3;
}

/// Deadline for a device location read
pub const LOCATION_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Location error {code}: {message}")]
pub struct LocationError {
    pub code: i32,
    pub message: String,
}

impl LocationError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Source of the device's current position
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_location(&self) -> Result<Coordinates, LocationError>;
}

/// Serves a fixed position from configuration, or none at all
pub struct ConfiguredLocationProvider {
    coordinates: Option<Coordinates>,
}

impl ConfiguredLocationProvider {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }

    /// Provider from the `[location]` config section
    pub fn from_config(config: &fieldguide_common::config::LocationConfig) -> Self {
        let coordinates = match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
                accuracy: config.accuracy,
            }),
            _ => None,
        };
        Self::new(coordinates)
    }
}

#[async_trait]
impl GeolocationProvider for ConfiguredLocationProvider {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        self.coordinates.ok_or_else(|| {
            LocationError::new(codes::POSITION_UNAVAILABLE, "No device location configured")
        })
    }
}

/// Truncate (not round) to two decimal places
pub fn truncate_coordinate(value: f64) -> f64 {
    (value * 100.0).trunc() / 100.0
}

/// Image plus the location error code, if any
#[derive(Debug, Clone, PartialEq)]
pub struct LocationAttachment {
    pub image: CapturedImage,
    pub error_code: Option<i32>,
}

pub struct LocationResolver {
    provider: Arc<dyn GeolocationProvider>,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn GeolocationProvider>) -> Self {
        Self {
            provider,
            timeout: Duration::from_millis(LOCATION_TIMEOUT_MS),
        }
    }

    /// Attach truncated device coordinates when the image has none
    ///
    /// An image that already has coordinates passes through with whatever
    /// code the capture side recorded.
    pub async fn attach_location(
        &self,
        image: CapturedImage,
        permission: LocationPermission,
    ) -> LocationAttachment {
        if image.latitude.is_some() {
            let error_code = image.error_code;
            return LocationAttachment { image, error_code };
        }

        if permission == LocationPermission::Denied {
            tracing::debug!("Location permission denied, skipping device location");
            return LocationAttachment {
                image,
                error_code: Some(codes::PERMISSION_DENIED),
            };
        }

        let error = match tokio::time::timeout(self.timeout, self.provider.current_location()).await
        {
            Ok(Ok(coords)) => {
                let truncated = Coordinates {
                    latitude: truncate_coordinate(coords.latitude),
                    longitude: truncate_coordinate(coords.longitude),
                    accuracy: coords.accuracy,
                };
                return LocationAttachment {
                    image: image.with_coordinates(truncated),
                    error_code: None,
                };
            }
            Ok(Err(e)) => e,
            Err(_) => LocationError::new(codes::TIMEOUT, "Location request timed out"),
        };

        tracing::info!(code = error.code, error = %error.message, "Device location unavailable");

        LocationAttachment {
            image,
            error_code: Some(error.code),
        }
    }
}

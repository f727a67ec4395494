//! Identification events
//!
//! One event per camera capture or library-photo selection. The event is
//! owned by the identification slot for its lifetime; the orchestrator only
//! reads it and hands back an updated copy of the image.

use super::prediction::{Prediction, PredictionSet, PredictionSource};
use serde::{Deserialize, Serialize};

/// Device coordinates attached to an image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

/// Captured image and its classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedImage {
    /// Local file path or `file://` URI
    pub uri: String,
    /// Capture time, unix seconds
    pub time: i64,
    /// On-device predictions; empty for images sent to the vision service
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    /// Score with the remote vision service instead of on-device predictions
    #[serde(default)]
    pub online_vision: bool,
    /// Location error code reported by the capture side
    pub error_code: Option<i32>,
}

impl CapturedImage {
    /// The image's predictions tagged with their source
    pub fn prediction_set(&self) -> PredictionSet {
        let source = if self.online_vision {
            PredictionSource::RemoteVision
        } else {
            PredictionSource::OnDevice
        };
        PredictionSet::new(self.predictions.clone(), source)
    }

    /// Coordinates, when both latitude and longitude are present
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
                accuracy: self.accuracy,
            }),
            _ => None,
        }
    }

    /// Copy of this image with coordinates set
    pub fn with_coordinates(mut self, coords: Coordinates) -> Self {
        self.latitude = Some(coords.latitude);
        self.longitude = Some(coords.longitude);
        self.accuracy = coords.accuracy;
        self
    }
}

/// Platform location permission, as reported by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationPermission {
    #[default]
    Granted,
    Denied,
}

/// One identification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationEvent {
    pub image: CapturedImage,
    /// User confirmed the photo (required before remote scoring)
    #[serde(default)]
    pub clicked: bool,
    #[serde(default)]
    pub location_permission: LocationPermission,
}

impl IdentificationEvent {
    pub fn is_online(&self) -> bool {
        self.image.online_vision
    }
}

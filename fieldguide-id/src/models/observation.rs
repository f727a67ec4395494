//! Persisted sighting records

use super::event::CapturedImage;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// First sighting of a taxon. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub taxon_id: i64,
    pub first_seen_at: DateTime<Utc>,
}

/// Observation stored alongside a first sighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub id: Uuid,
    pub taxon_id: i64,
    pub name: String,
    pub iconic_group: i64,
    pub ancestor_ids: Vec<i64>,
    pub photo_url: Option<String>,
    pub image_uri: String,
    pub observed_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
}

impl ObservationRecord {
    /// Build an observation of `taxon_id` from the image that identified it
    pub fn new(
        taxon_id: i64,
        name: impl Into<String>,
        iconic_group: i64,
        ancestor_ids: Vec<i64>,
        photo_url: Option<String>,
        image: &CapturedImage,
    ) -> Self {
        let observed_at = Utc
            .timestamp_opt(image.time, 0)
            .single()
            .unwrap_or_else(Utc::now);

        Self {
            id: Uuid::new_v4(),
            taxon_id,
            name: name.into(),
            iconic_group,
            ancestor_ids,
            photo_url,
            image_uri: image.uri.clone(),
            observed_at,
            latitude: image.latitude,
            longitude: image.longitude,
            accuracy: image.accuracy,
        }
    }
}

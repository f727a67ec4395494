//! Observation persistence

use crate::models::ObservationRecord;
use chrono::{DateTime, Utc};
use fieldguide_common::{Error, Result};
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

/// Insert an observation on an open connection (usually inside a transaction)
pub async fn insert_observation(
    conn: &mut SqliteConnection,
    observation: &ObservationRecord,
) -> Result<()> {
    let ancestor_ids = serde_json::to_string(&observation.ancestor_ids)?;

    sqlx::query(
        r#"
        INSERT INTO observations (
            id, taxon_id, name, iconic_group, ancestor_ids, photo_url,
            image_uri, observed_at, latitude, longitude, accuracy
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(observation.id.to_string())
    .bind(observation.taxon_id)
    .bind(&observation.name)
    .bind(observation.iconic_group)
    .bind(ancestor_ids)
    .bind(&observation.photo_url)
    .bind(&observation.image_uri)
    .bind(observation.observed_at.to_rfc3339())
    .bind(observation.latitude)
    .bind(observation.longitude)
    .bind(observation.accuracy)
    .execute(conn)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

/// Load all observations of `taxon_id`, oldest first
pub async fn load_observations_for_taxon(
    db: &Pool<Sqlite>,
    taxon_id: i64,
) -> Result<Vec<ObservationRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, taxon_id, name, iconic_group, ancestor_ids, photo_url,
               image_uri, observed_at, latitude, longitude, accuracy
        FROM observations
        WHERE taxon_id = ?
        ORDER BY observed_at
        "#,
    )
    .bind(taxon_id)
    .fetch_all(db)
    .await
    .map_err(Error::Database)?;

    rows.iter()
        .map(|row| {
            let id: String = row.get("id");
            let ancestor_ids: String = row.get("ancestor_ids");
            let observed_at: String = row.get("observed_at");

            Ok(ObservationRecord {
                id: Uuid::parse_str(&id).map_err(|e| Error::corrupt("observations", &id, e))?,
                taxon_id: row.get("taxon_id"),
                name: row.get("name"),
                iconic_group: row.get("iconic_group"),
                ancestor_ids: serde_json::from_str(&ancestor_ids)
                    .map_err(|e| Error::corrupt("observations", &id, e))?,
                photo_url: row.get("photo_url"),
                image_uri: row.get("image_uri"),
                observed_at: DateTime::parse_from_rfc3339(&observed_at)
                    .map_err(|e| Error::corrupt("observations", &id, e))?
                    .with_timezone(&Utc),
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                accuracy: row.get("accuracy"),
            })
        })
        .collect()
}

/// Total number of stored observations
pub async fn count_observations(db: &Pool<Sqlite>) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM observations")
        .fetch_one(db)
        .await
        .map_err(Error::Database)?;
    Ok(count.0)
}

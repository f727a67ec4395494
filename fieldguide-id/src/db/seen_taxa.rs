//! Seen-taxon ledger persistence
//!
//! One row per taxon, keyed by taxon id. The first-sighting write is an
//! atomic check-and-insert; a second writer for the same id is a no-op.

use crate::db::observations;
use crate::models::{ObservationRecord, SeenRecord};
use chrono::{DateTime, Utc};
use fieldguide_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Look up the first sighting of `taxon_id`
pub async fn find_first_seen(db: &Pool<Sqlite>, taxon_id: i64) -> Result<Option<SeenRecord>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT first_seen_at FROM seen_taxa WHERE taxon_id = ?")
            .bind(taxon_id)
            .fetch_optional(db)
            .await
            .map_err(Error::Database)?;

    match row {
        Some((first_seen_at,)) => {
            let first_seen_at = DateTime::parse_from_rfc3339(&first_seen_at)
                .map_err(|e| Error::corrupt("seen_taxa", taxon_id, e))?
                .with_timezone(&Utc);
            Ok(Some(SeenRecord {
                taxon_id,
                first_seen_at,
            }))
        }
        None => Ok(None),
    }
}

/// Record a first sighting and its observation in one transaction
///
/// **Returns:** true if this call created the seen row, false if the taxon
/// was already recorded (the observation is then not written).
pub async fn insert_first_sighting(
    db: &Pool<Sqlite>,
    record: &SeenRecord,
    observation: Option<&ObservationRecord>,
) -> Result<bool> {
    let mut tx = db.begin().await.map_err(Error::Database)?;

    let result = sqlx::query(
        "INSERT INTO seen_taxa (taxon_id, first_seen_at) VALUES (?, ?)
         ON CONFLICT(taxon_id) DO NOTHING",
    )
    .bind(record.taxon_id)
    .bind(record.first_seen_at.to_rfc3339())
    .execute(&mut *tx)
    .await
    .map_err(Error::Database)?;

    let inserted = result.rows_affected() == 1;

    if inserted {
        if let Some(observation) = observation {
            observations::insert_observation(&mut *tx, observation).await?;
        }
    }

    tx.commit().await.map_err(Error::Database)?;

    Ok(inserted)
}

/// Number of distinct taxa seen
pub async fn count_seen(db: &Pool<Sqlite>) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM seen_taxa")
        .fetch_one(db)
        .await
        .map_err(Error::Database)?;
    Ok(count.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> Pool<Sqlite> {
        // Single connection: each in-memory connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn record(taxon_id: i64) -> SeenRecord {
        SeenRecord {
            taxon_id,
            first_seen_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_unseen_taxon() {
        let pool = setup_test_db().await;
        assert!(find_first_seen(&pool, 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let pool = setup_test_db().await;

        assert!(insert_first_sighting(&pool, &record(5), None).await.unwrap());

        let found = find_first_seen(&pool, 5).await.unwrap().unwrap();
        assert_eq!(found, record(5));
    }

    #[tokio::test]
    async fn test_second_insert_keeps_first_date() {
        let pool = setup_test_db().await;
        insert_first_sighting(&pool, &record(5), None).await.unwrap();

        let later = SeenRecord {
            taxon_id: 5,
            first_seen_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        };
        assert!(!insert_first_sighting(&pool, &later, None).await.unwrap());

        let found = find_first_seen(&pool, 5).await.unwrap().unwrap();
        assert_eq!(found.first_seen_at, record(5).first_seen_at);
        assert_eq!(count_seen(&pool).await.unwrap(), 1);
    }
}

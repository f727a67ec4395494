//! Database Test Utilities

use anyhow::Result;
use chrono::{DateTime, Utc};
use fieldguide_id::models::SeenRecord;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a file-backed test database with tables initialized
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join(fieldguide_id::db::DATABASE_FILE);

    let pool = fieldguide_id::db::init_database_pool(&db_path).await?;

    Ok((temp_dir, pool))
}

/// Single-connection in-memory database
///
/// One connection only: every in-memory connection is a separate database.
pub async fn create_memory_db() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    fieldguide_id::db::init_tables(&pool).await?;
    Ok(pool)
}

/// Mark `taxon_id` as first seen at `first_seen_at`
pub async fn seed_seen(pool: &SqlitePool, taxon_id: i64, first_seen_at: DateTime<Utc>) {
    let record = SeenRecord {
        taxon_id,
        first_seen_at,
    };
    let inserted = fieldguide_id::db::seen_taxa::insert_first_sighting(pool, &record, None)
        .await
        .unwrap();
    assert!(inserted, "taxon {} was already seeded", taxon_id);
}

//! Database access for fieldguide-id
//!
//! SQLite database in the root folder holding settings, the seen-taxon
//! ledger and first-sighting observations.

pub mod observations;
pub mod seen_taxa;
pub mod settings;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "fieldguide.db";

/// Initialize database connection pool
///
/// Creates the parent directory and the database file when missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create fieldguide-id tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS seen_taxa (
            taxon_id INTEGER PRIMARY KEY,
            first_seen_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS observations (
            id TEXT PRIMARY KEY,
            taxon_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            iconic_group INTEGER NOT NULL,
            ancestor_ids TEXT NOT NULL DEFAULT '[]',
            photo_url TEXT,
            image_uri TEXT NOT NULL,
            observed_at TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            accuracy REAL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_observations_taxon ON observations(taxon_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (settings, seen_taxa, observations)");

    Ok(())
}

//! Settings database operations
//!
//! Key-value accessors over the `settings` table.

use fieldguide_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Settings key holding the vision token signing secret
pub const VISION_SECRET_KEY: &str = "vision_secret";

/// Get vision signing secret from database
///
/// **Returns:** Some(secret) if set, None otherwise
pub async fn get_vision_secret(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, VISION_SECRET_KEY).await
}

/// Set vision signing secret in database
pub async fn set_vision_secret(db: &Pool<Sqlite>, secret: String) -> Result<()> {
    set_setting(db, VISION_SECRET_KEY, secret).await
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting {} failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (insert or overwrite)
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_vision_secret_missing() {
        let pool = setup_test_db().await;
        assert_eq!(get_vision_secret(&pool).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_vision_secret_overwrite() {
        let pool = setup_test_db().await;

        set_vision_secret(&pool, "first".to_string()).await.unwrap();
        set_vision_secret(&pool, "second".to_string()).await.unwrap();

        assert_eq!(
            get_vision_secret(&pool).await.unwrap(),
            Some("second".to_string())
        );

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_typed_setting_parse_error() {
        let pool = setup_test_db().await;
        set_setting(&pool, "number", "not-a-number").await.unwrap();

        let result = get_setting::<u64>(&pool, "number").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

//! Retry for transient SQLite lock errors
//!
//! Concurrent first-sighting transactions on a file-backed database can fail
//! with SQLITE_BUSY when two writers upgrade at once. Those writes are
//! idempotent (ON CONFLICT DO NOTHING), so retrying is safe.

use fieldguide_common::{Error, Result};
use std::time::{Duration, Instant};

/// Default retry window for ledger writes
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// True for SQLite "database is locked" / "database is busy" errors
pub fn is_lock_error(err: &Error) -> bool {
    match err {
        Error::Database(db_err) => {
            let msg = db_err.to_string();
            msg.contains("database is locked") || msg.contains("database is busy")
        }
        _ => false,
    }
}

/// Retry `operation` with exponential backoff while it fails with a lock error
///
/// Backoff starts at 10ms and doubles up to 1000ms. Non-lock errors return
/// immediately. Once `max_wait_ms` has elapsed the last attempt's failure is
/// reported as `Error::LedgerBusy`.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if is_lock_error(&err) => {
                let elapsed = start_time.elapsed();

                if elapsed >= max_duration {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        max_wait_ms,
                        "Database operation failed: max retry time exceeded"
                    );
                    return Err(Error::LedgerBusy {
                        operation: operation_name.to_string(),
                        attempts: attempt,
                        waited_ms: elapsed.as_millis() as u64,
                    });
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    "Database locked, will retry after backoff"
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let result = retry_on_lock("test_op", 100, || async { Ok::<i32, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_lock_error_fails_immediately() {
        let mut attempts = 0;

        let result = retry_on_lock("test_op", 5000, || {
            attempts += 1;
            async { Err::<i32, Error>(Error::Config("database is locked".to_string())) }
        })
        .await;

        // Only sqlx errors count as lock errors
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_lock_error_detection() {
        assert!(!is_lock_error(&Error::corrupt("seen_taxa", 1, "x")));
        assert!(!is_lock_error(&Error::Database(sqlx::Error::RowNotFound)));
    }
}

//! Errors raised by the seen-taxon ledger and its configuration

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[cfg(feature = "sqlx")]
    #[error("Ledger database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable settings, including the vision secret
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ancestor id list could not be encoded for storage
    #[error("Encoding ancestor ids failed: {0}")]
    AncestorIds(#[from] serde_json::Error),

    /// A stored row that no longer decodes into a record
    #[error("Corrupt {table} row {key}: {detail}")]
    CorruptRecord {
        table: &'static str,
        key: String,
        detail: String,
    },

    /// Ledger write still locked when the retry window ran out
    #[error("{operation}: ledger locked after {attempts} attempts ({waited_ms} ms)")]
    LedgerBusy {
        operation: String,
        attempts: u32,
        waited_ms: u64,
    },
}

impl Error {
    pub fn corrupt(table: &'static str, key: impl ToString, detail: impl ToString) -> Self {
        Error::CorruptRecord {
            table,
            key: key.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Transient failures a caller may retry later
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::LedgerBusy { .. })
    }
}

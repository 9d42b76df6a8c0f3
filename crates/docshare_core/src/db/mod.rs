//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the document-sharing core.
//! - Apply schema migrations in deterministic order.
//! - Hand out write transactions that services share across repositories.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

/// Starts an `IMMEDIATE` write transaction on a shared connection handle.
///
/// Services hold `&Connection`, so the borrow checker cannot prove that no
/// other transaction is open. SQLite reports nested `BEGIN` as an error, which
/// surfaces here instead of corrupting state.
pub fn write_transaction(conn: &Connection) -> DbResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::now_epoch_ms;

    #[test]
    fn clock_reports_milliseconds_since_epoch() {
        // 2020-09-13 in epoch milliseconds.
        assert!(now_epoch_ms() > 1_600_000_000_000);
    }
}

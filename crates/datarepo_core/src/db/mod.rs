//! SQLite connection bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure the SQLite connection every repository borrows.
//! - Apply caller-supplied schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not read/write application data before migrations succeed.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Infrastructure errors reported by the wrapped database layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Any failure reported by SQLite itself.
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The database was migrated by a newer build than this one.
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The migration list handed to the runner is malformed.
    #[error("invalid migration list: {0}")]
    InvalidMigrations(String),
}

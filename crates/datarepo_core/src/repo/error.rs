//! Repository error taxonomy and result normalization.
//!
//! # Responsibility
//! - Separate "no matching record" from infrastructure failures.
//! - Normalize raw SQLite outcomes into repository results.
//!
//! # Invariants
//! - `RecordNotFound` is only produced by strict single-row fetches.
//! - Absence on non-strict reads is success (`None` / empty `Vec`).

use crate::db::DbError;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Strict fetch matched no row.
    #[error("record not found")]
    RecordNotFound,
    /// Strict fetch matched more than one row.
    #[error("expected exactly one record, matched {count}")]
    AmbiguousMatch { count: usize },
    /// Any database failure other than absence.
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error("invalid SQL identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("unknown relation `{relation}` on `{table}`")]
    UnknownRelation {
        table: &'static str,
        relation: String,
    },
    #[error("`{table}` record has no primary key value")]
    MissingPrimaryKey { table: &'static str },
    #[error("invalid record definition: {0}")]
    InvalidRecord(String),
}

impl RepoError {
    /// True only for the not-found sentinel.
    pub fn is_record_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps "query returned no rows" to `Ok(None)` and wraps every other error.
pub fn handle_error<V>(result: rusqlite::Result<V>) -> RepoResult<Option<V>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Enforces exactly-one-row semantics on an already fetched row set.
pub fn handle_one_error<V>(mut rows: Vec<V>) -> RepoResult<V> {
    match rows.len() {
        0 => Err(RepoError::RecordNotFound),
        1 => Ok(rows.remove(0)),
        count => Err(RepoError::AmbiguousMatch { count }),
    }
}

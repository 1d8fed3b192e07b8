//! Repository contracts: base read/write and transactional extension.
//!
//! # Responsibility
//! - Declare the uniform CRUD/query surface shared by every record type.
//!
//! # Invariants
//! - `find_*` reads treat absence as success.
//! - `get_one_*` reads require exactly one matching row.
//! - `*_tx` writes run on the caller's transaction and never finish it.

use crate::model::record::Record;
use crate::query::{BatchQuery, Fields, Page, Search};
use crate::repo::error::RepoResult;
use crate::repo::scoped::ScopedQuery;
use rusqlite::types::Value;
use rusqlite::{Connection, Transaction};

/// One page of rows plus the total match count ignoring pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    pub rows: Vec<T>,
    pub total: u64,
}

/// Base read/write repository contract.
///
/// `preloads` parameters: an empty slice keeps the repository's default
/// preloads, a non-empty slice replaces them for that call.
pub trait Repository<T: Record> {
    /// The wrapped connection handle.
    fn db(&self) -> &Connection;
    /// A read query with default joins and the effective preloads applied.
    fn query(&self, preloads: &[&str]) -> ScopedQuery<'_, T>;

    fn find_all(&self, preloads: &[&str]) -> RepoResult<Vec<T>>;
    fn find_batch(&self, query: &BatchQuery) -> RepoResult<Batch<T>>;

    fn find_where(&self, condition: &str, preloads: &[&str]) -> RepoResult<Vec<T>>;
    fn find_where_batch(
        &self,
        condition: &str,
        page: Page,
        preloads: &[&str],
    ) -> RepoResult<Vec<T>>;

    fn find_by_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        preloads: &[&str],
    ) -> RepoResult<Vec<T>>;
    fn find_by_fields(&self, fields: &Fields, preloads: &[&str]) -> RepoResult<Vec<T>>;
    fn find_by_field_batch(
        &self,
        field: &str,
        value: impl Into<Value>,
        page: Page,
        preloads: &[&str],
    ) -> RepoResult<Vec<T>>;
    fn find_by_fields_batch(
        &self,
        fields: &Fields,
        page: Page,
        preloads: &[&str],
    ) -> RepoResult<Vec<T>>;

    fn find_one_by_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        preloads: &[&str],
    ) -> RepoResult<Option<T>>;
    fn find_one_by_fields(&self, fields: &Fields, preloads: &[&str]) -> RepoResult<Option<T>>;
    fn find_one_by_id(&self, id: impl Into<Value>, preloads: &[&str]) -> RepoResult<Option<T>>;

    fn get_one_by_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        preloads: &[&str],
    ) -> RepoResult<T>;
    fn get_one_by_fields(&self, fields: &Fields, preloads: &[&str]) -> RepoResult<T>;
    fn get_one_by_id(&self, id: impl Into<Value>, preloads: &[&str]) -> RepoResult<T>;

    /// Executes `sql` verbatim and decodes rows as `T`. No validation.
    fn find_by_raw_query(&self, sql: &str, params: &[Value]) -> RepoResult<Vec<T>>;
    fn search(&self, search: &Search, page: Page, preloads: &[&str]) -> RepoResult<Batch<T>>;
    fn count_by_fields(&self, fields: &Fields) -> RepoResult<u64>;

    /// Returns the first row matching `fields`, creating `record` when none does.
    ///
    /// `record` must carry every lookup value, otherwise `InvalidRecord` is
    /// returned before anything is written. Preloads apply on both paths.
    fn first_or_create(&self, fields: &Fields, record: T) -> RepoResult<T>;

    fn create(&self, record: &mut T) -> RepoResult<()>;
    /// Inserts, or updates every non-key column when the key already exists.
    fn save(&self, record: &mut T) -> RepoResult<()>;
    fn delete(&self, record: &T) -> RepoResult<()>;
}

/// Write operations bound to an externally managed transaction.
pub trait TransactionRepository<T: Record>: Repository<T> {
    fn create_tx(&self, record: &mut T, tx: &Transaction<'_>) -> RepoResult<()>;
    fn save_tx(&self, record: &mut T, tx: &Transaction<'_>) -> RepoResult<()>;
    fn delete_tx(&self, record: &T, tx: &Transaction<'_>) -> RepoResult<()>;
    fn first_or_create_tx(
        &self,
        fields: &Fields,
        record: T,
        tx: &Transaction<'_>,
    ) -> RepoResult<T>;
}

//! Record contract implemented by caller-owned row types.
//!
//! # Responsibility
//! - Describe table, columns and primary key of one record type.
//! - Convert between SQLite rows/values and the record.
//! - Provide the eager-loading hook used for preloads.
//!
//! # Invariants
//! - `values()` yields exactly one value per entry of `columns()`, same order.
//! - `primary_key()` returns `Value::Null` only for records not yet inserted.

use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

/// A type the generic repository can read and write.
///
/// ```
/// use datarepo_core::Record;
/// use rusqlite::types::Value;
/// use rusqlite::Row;
///
/// struct Company {
///     id: Option<i64>,
///     name: String,
/// }
///
/// impl Record for Company {
///     const TABLE: &'static str = "companies";
///
///     fn columns() -> &'static [&'static str] {
///         &["id", "name"]
///     }
///
///     fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
///         Ok(Self { id: row.get("id")?, name: row.get("name")? })
///     }
///
///     fn values(&self) -> Vec<Value> {
///         vec![self.primary_key(), Value::from(self.name.clone())]
///     }
///
///     fn primary_key(&self) -> Value {
///         self.id.map_or(Value::Null, Value::from)
///     }
///
///     fn set_primary_key(&mut self, rowid: i64) {
///         self.id = Some(rowid);
///     }
/// }
/// ```
pub trait Record: Sized {
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str = "id";

    /// Persisted columns, primary key included.
    fn columns() -> &'static [&'static str];

    /// Decodes one row selected with `columns()` as result column names.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Column values in `columns()` order.
    fn values(&self) -> Vec<Value>;

    fn primary_key(&self) -> Value;

    /// Receives the rowid SQLite assigned when `create` omitted the key.
    fn set_primary_key(&mut self, _rowid: i64) {}

    /// Eager-loads `relation` into every record of `records`.
    fn load_relation(
        _conn: &Connection,
        _records: &mut [Self],
        relation: &str,
    ) -> RepoResult<()> {
        Err(RepoError::UnknownRelation {
            table: Self::TABLE,
            relation: relation.to_string(),
        })
    }
}

/// Pairs `columns()` with `values()`, rejecting records that break the
/// one-value-per-column invariant.
pub(crate) fn column_values<T: Record>(record: &T) -> RepoResult<Vec<(&'static str, Value)>> {
    let columns = T::columns();
    let values = record.values();
    if columns.len() != values.len() {
        return Err(RepoError::InvalidRecord(format!(
            "`{}` declares {} columns but produced {} values",
            T::TABLE,
            columns.len(),
            values.len()
        )));
    }
    if !columns.contains(&T::PRIMARY_KEY) {
        return Err(RepoError::InvalidRecord(format!(
            "`{}` primary key `{}` is not listed in columns",
            T::TABLE,
            T::PRIMARY_KEY
        )));
    }
    Ok(columns.iter().copied().zip(values).collect())
}

//! SQLite implementation of the repository contracts.
//!
//! # Responsibility
//! - Translate repository calls into SQL on a borrowed connection.
//! - Apply default joins/preloads fixed at construction to every read.
//!
//! # Invariants
//! - The borrowed connection outlives the repository (`'conn`).
//! - `Associations` cannot change after construction.
//! - Transactions are only borrowed; they are never begun, committed or
//!   rolled back here.

use crate::model::record::{column_values, Record};
use crate::query::ident::quote_identifier;
use crate::query::{BatchQuery, Fields, Filter, Page, Search, Statement};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::exec::{execute, query_rows};
use crate::repo::repository::{Batch, Repository, TransactionRepository};
use crate::repo::scoped::ScopedQuery;
use rusqlite::types::Value;
use rusqlite::{Connection, Transaction};
use serde::Deserialize;
use std::marker::PhantomData;

/// Default eager-loading applied to every read of one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Associations {
    /// Raw join clauses, e.g. `LEFT JOIN companies ON companies.id = users.company_id`.
    pub joins: Vec<String>,
    /// Relation names resolved by `Record::load_relation`.
    pub preloads: Vec<String>,
}

/// SQLite-backed generic repository.
pub struct SqliteRepository<'conn, T: Record> {
    conn: &'conn Connection,
    associations: Associations,
    _record: PhantomData<fn() -> T>,
}

impl<'conn, T: Record> SqliteRepository<'conn, T> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_associations(conn, Associations::default())
    }

    pub fn with_associations(conn: &'conn Connection, associations: Associations) -> Self {
        Self {
            conn,
            associations,
            _record: PhantomData,
        }
    }

    pub fn associations(&self) -> &Associations {
        &self.associations
    }

    fn scoped_on<'a>(&self, conn: &'a Connection, preloads: &[&str]) -> ScopedQuery<'a, T> {
        let preloads = if preloads.is_empty() {
            self.associations.preloads.clone()
        } else {
            preloads.iter().map(|relation| relation.to_string()).collect()
        };
        ScopedQuery::new(conn, self.associations.joins.clone(), preloads)
    }

    fn first_or_create_on(&self, conn: &Connection, fields: &Fields, mut record: T) -> RepoResult<T> {
        let scoped = self
            .scoped_on(conn, &[])
            .filter(Filter::fields(fields.clone()));
        if let Some(found) = scoped.first()? {
            return Ok(found);
        }
        ensure_record_matches(&record, fields)?;
        insert_record(conn, &mut record, "first_or_create")?;
        scoped.load_preloads(std::slice::from_mut(&mut record))?;
        Ok(record)
    }
}

impl<T: Record> Repository<T> for SqliteRepository<'_, T> {
    fn db(&self) -> &Connection {
        self.conn
    }

    fn query(&self, preloads: &[&str]) -> ScopedQuery<'_, T> {
        self.scoped_on(self.conn, preloads)
    }

    fn find_all(&self, preloads: &[&str]) -> RepoResult<Vec<T>> {
        self.query(preloads).all()
    }

    fn find_batch(&self, query: &BatchQuery) -> RepoResult<Batch<T>> {
        self.query(&[]).apply(query).batch()
    }

    fn find_where(&self, condition: &str, preloads: &[&str]) -> RepoResult<Vec<T>> {
        self.query(preloads).where_raw(condition).all()
    }

    fn find_where_batch(
        &self,
        condition: &str,
        page: Page,
        preloads: &[&str],
    ) -> RepoResult<Vec<T>> {
        self.query(preloads).where_raw(condition).page(page).all()
    }

    fn find_by_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        preloads: &[&str],
    ) -> RepoResult<Vec<T>> {
        self.query(preloads).where_field(field, value).all()
    }

    fn find_by_fields(&self, fields: &Fields, preloads: &[&str]) -> RepoResult<Vec<T>> {
        self.query(preloads)
            .filter(Filter::fields(fields.clone()))
            .all()
    }

    fn find_by_field_batch(
        &self,
        field: &str,
        value: impl Into<Value>,
        page: Page,
        preloads: &[&str],
    ) -> RepoResult<Vec<T>> {
        self.query(preloads)
            .where_field(field, value)
            .page(page)
            .all()
    }

    fn find_by_fields_batch(
        &self,
        fields: &Fields,
        page: Page,
        preloads: &[&str],
    ) -> RepoResult<Vec<T>> {
        self.query(preloads)
            .filter(Filter::fields(fields.clone()))
            .page(page)
            .all()
    }

    fn find_one_by_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        preloads: &[&str],
    ) -> RepoResult<Option<T>> {
        self.query(preloads).where_field(field, value).first()
    }

    fn find_one_by_fields(&self, fields: &Fields, preloads: &[&str]) -> RepoResult<Option<T>> {
        self.query(preloads)
            .filter(Filter::fields(fields.clone()))
            .first()
    }

    fn find_one_by_id(&self, id: impl Into<Value>, preloads: &[&str]) -> RepoResult<Option<T>> {
        self.find_one_by_field(T::PRIMARY_KEY, id, preloads)
    }

    fn get_one_by_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        preloads: &[&str],
    ) -> RepoResult<T> {
        self.query(preloads).where_field(field, value).one()
    }

    fn get_one_by_fields(&self, fields: &Fields, preloads: &[&str]) -> RepoResult<T> {
        self.query(preloads)
            .filter(Filter::fields(fields.clone()))
            .one()
    }

    fn get_one_by_id(&self, id: impl Into<Value>, preloads: &[&str]) -> RepoResult<T> {
        self.get_one_by_field(T::PRIMARY_KEY, id, preloads)
    }

    fn find_by_raw_query(&self, sql: &str, params: &[Value]) -> RepoResult<Vec<T>> {
        let statement = Statement {
            sql: sql.to_string(),
            params: params.to_vec(),
        };
        query_rows::<T>(self.conn, "raw", &statement)
    }

    fn search(&self, search: &Search, page: Page, preloads: &[&str]) -> RepoResult<Batch<T>> {
        self.query(preloads)
            .filter(Filter::default().with_search(search.clone()))
            .page(page)
            .batch()
    }

    fn count_by_fields(&self, fields: &Fields) -> RepoResult<u64> {
        self.query(&[])
            .filter(Filter::fields(fields.clone()))
            .count()
    }

    fn first_or_create(&self, fields: &Fields, record: T) -> RepoResult<T> {
        self.first_or_create_on(self.conn, fields, record)
    }

    fn create(&self, record: &mut T) -> RepoResult<()> {
        insert_record(self.conn, record, "create")
    }

    fn save(&self, record: &mut T) -> RepoResult<()> {
        upsert_record(self.conn, record)
    }

    fn delete(&self, record: &T) -> RepoResult<()> {
        delete_record(self.conn, record)
    }
}

impl<T: Record> TransactionRepository<T> for SqliteRepository<'_, T> {
    fn create_tx(&self, record: &mut T, tx: &Transaction<'_>) -> RepoResult<()> {
        insert_record(tx, record, "create_tx")
    }

    fn save_tx(&self, record: &mut T, tx: &Transaction<'_>) -> RepoResult<()> {
        upsert_record(tx, record)
    }

    fn delete_tx(&self, record: &T, tx: &Transaction<'_>) -> RepoResult<()> {
        delete_record(tx, record)
    }

    fn first_or_create_tx(
        &self,
        fields: &Fields,
        record: T,
        tx: &Transaction<'_>,
    ) -> RepoResult<T> {
        self.first_or_create_on(tx, fields, record)
    }
}

fn insert_record<T: Record>(conn: &Connection, record: &mut T, op: &'static str) -> RepoResult<()> {
    let auto_key = record.primary_key() == Value::Null;
    let pairs: Vec<_> = column_values(record)?
        .into_iter()
        .filter(|(column, _)| !(auto_key && *column == T::PRIMARY_KEY))
        .collect();

    let table = quote_identifier(T::TABLE)?;
    let statement = if pairs.is_empty() {
        Statement {
            sql: format!("INSERT INTO {table} DEFAULT VALUES"),
            params: Vec::new(),
        }
    } else {
        let (columns, params) = split_pairs(pairs)?;
        let placeholders = vec!["?"; params.len()].join(", ");
        Statement {
            sql: format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders})",
                columns.join(", ")
            ),
            params,
        }
    };

    execute(conn, T::TABLE, op, &statement)?;
    if auto_key {
        record.set_primary_key(conn.last_insert_rowid());
    }
    Ok(())
}

fn upsert_record<T: Record>(conn: &Connection, record: &mut T) -> RepoResult<()> {
    if record.primary_key() == Value::Null {
        return insert_record(conn, record, "save");
    }

    let pairs = column_values(record)?;
    let primary_key = quote_identifier(T::PRIMARY_KEY)?;
    let updates = pairs
        .iter()
        .filter(|(column, _)| *column != T::PRIMARY_KEY)
        .map(|(column, _)| {
            quote_identifier(column).map(|quoted| format!("{quoted} = excluded.{quoted}"))
        })
        .collect::<RepoResult<Vec<_>>>()?;
    let (columns, params) = split_pairs(pairs)?;
    let placeholders = vec!["?"; params.len()].join(", ");

    let conflict_action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };
    let statement = Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({placeholders}) ON CONFLICT({primary_key}) {conflict_action}",
            quote_identifier(T::TABLE)?,
            columns.join(", ")
        ),
        params,
    };

    execute(conn, T::TABLE, "save", &statement)?;
    Ok(())
}

fn delete_record<T: Record>(conn: &Connection, record: &T) -> RepoResult<()> {
    let key = record.primary_key();
    if key == Value::Null {
        return Err(RepoError::MissingPrimaryKey { table: T::TABLE });
    }

    let statement = Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_identifier(T::TABLE)?,
            quote_identifier(T::PRIMARY_KEY)?
        ),
        params: vec![key],
    };
    execute(conn, T::TABLE, "delete", &statement)?;
    Ok(())
}

/// Rejects a record that would not be found again by `fields`.
fn ensure_record_matches<T: Record>(record: &T, fields: &Fields) -> RepoResult<()> {
    let pairs = column_values(record)?;
    for (field, expected) in fields {
        let column = match field.split_once('.') {
            Some((table, column)) if table == T::TABLE => column,
            Some(_) => {
                return Err(RepoError::InvalidRecord(format!(
                    "lookup field `{field}` is not a column of `{}`",
                    T::TABLE
                )))
            }
            None => field.as_str(),
        };
        let Some((_, actual)) = pairs.iter().find(|(name, _)| *name == column) else {
            return Err(RepoError::InvalidRecord(format!(
                "lookup field `{field}` is not a column of `{}`",
                T::TABLE
            )));
        };
        if actual != expected {
            return Err(RepoError::InvalidRecord(format!(
                "record value for `{column}` does not match lookup value {expected:?}"
            )));
        }
    }
    Ok(())
}

fn split_pairs(pairs: Vec<(&'static str, Value)>) -> RepoResult<(Vec<String>, Vec<Value>)> {
    let mut columns = Vec::with_capacity(pairs.len());
    let mut params = Vec::with_capacity(pairs.len());
    for (column, value) in pairs {
        columns.push(quote_identifier(column)?);
        params.push(value);
    }
    Ok((columns, params))
}

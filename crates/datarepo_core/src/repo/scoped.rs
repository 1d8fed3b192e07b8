//! Chainable read query with repository defaults already applied.
//!
//! # Responsibility
//! - Carry joins, preloads, filter, ordering, grouping and page for one read.
//! - Execute it as many rows, first row, exactly one row, count or batch.
//!
//! # Invariants
//! - Preloads run after the main query, only when at least one row matched.
//! - `count` and `batch.total` ignore ordering and pagination.

use crate::model::record::Record;
use crate::query::{BatchQuery, Filter, OrderBy, Page, SelectBuilder};
use crate::repo::error::{handle_one_error, RepoError, RepoResult};
use crate::repo::exec::{query_count, query_first, query_rows};
use crate::repo::repository::Batch;
use log::debug;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::marker::PhantomData;

/// One read against `T::TABLE`, bound to a connection.
pub struct ScopedQuery<'conn, T: Record> {
    conn: &'conn Connection,
    joins: Vec<String>,
    preloads: Vec<String>,
    filter: Filter,
    order_by: Vec<OrderBy>,
    group_by: Option<String>,
    page: Page,
    _record: PhantomData<fn() -> T>,
}

impl<'conn, T: Record> ScopedQuery<'conn, T> {
    pub(crate) fn new(conn: &'conn Connection, joins: Vec<String>, preloads: Vec<String>) -> Self {
        Self {
            conn,
            joins,
            preloads,
            filter: Filter::default(),
            order_by: Vec::new(),
            group_by: None,
            page: Page::default(),
            _record: PhantomData,
        }
    }

    /// Replaces the join clauses for this query.
    pub fn joins<I, S>(mut self, joins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.joins = joins.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the preload relations for this query.
    pub fn preloads<I, S>(mut self, preloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preloads = preloads.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the raw `WHERE` condition.
    pub fn where_raw(mut self, condition: impl Into<String>) -> Self {
        self.filter.condition = Some(condition.into());
        self
    }

    /// Adds one equality condition.
    pub fn where_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.fields.insert(field.into(), value.into());
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn group_by(mut self, clause: impl Into<String>) -> Self {
        self.group_by = Some(clause.into());
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// Applies every part of `query`; joins and preloads only override when set.
    pub fn apply(mut self, query: &BatchQuery) -> Self {
        self.filter = query.filter.clone();
        self.order_by = query.order_by.clone();
        self.group_by = query.group_by.clone();
        self.page = query.page;
        if let Some(joins) = &query.joins {
            self.joins = joins.clone();
        }
        if !query.preloads.is_empty() {
            self.preloads = query.preloads.clone();
        }
        self
    }

    pub fn joins_in_use(&self) -> &[String] {
        &self.joins
    }

    pub fn preloads_in_use(&self) -> &[String] {
        &self.preloads
    }

    /// All matching rows within the page.
    pub fn all(&self) -> RepoResult<Vec<T>> {
        let statement = self.builder().page(self.page).build()?;
        let mut rows = query_rows::<T>(self.conn, "find", &statement)?;
        self.load_preloads(&mut rows)?;
        Ok(rows)
    }

    /// First matching row, `None` when nothing matched.
    ///
    /// Without explicit ordering the first row is the lowest primary key.
    pub fn first(&self) -> RepoResult<Option<T>> {
        let page = Page::new(1, self.page.offset);
        let statement = self
            .builder()
            .primary_key_fallback()
            .page(page)
            .build()?;
        let Some(record) = query_first::<T>(self.conn, "first", &statement)? else {
            return Ok(None);
        };
        let mut rows = [record];
        self.load_preloads(&mut rows)?;
        let [record] = rows;
        Ok(Some(record))
    }

    /// Exactly one matching row.
    ///
    /// # Errors
    /// - `RecordNotFound` when nothing matched.
    /// - `AmbiguousMatch` with the full match count when several rows matched.
    ///
    /// The query's page is ignored: every matching row counts.
    pub fn one(&self) -> RepoResult<T> {
        let page = Page::new(2, 0);
        let statement = self
            .builder()
            .primary_key_fallback()
            .page(page)
            .build()?;
        let mut rows = query_rows::<T>(self.conn, "one", &statement)?;
        if rows.len() > 1 {
            let count = usize::try_from(self.count()?).unwrap_or(usize::MAX);
            return Err(RepoError::AmbiguousMatch { count });
        }
        self.load_preloads(&mut rows)?;
        handle_one_error(rows)
    }

    /// Number of matching rows (groups, when grouped).
    pub fn count(&self) -> RepoResult<u64> {
        let statement = self.builder().build_count()?;
        query_count(self.conn, T::TABLE, "count", &statement)
    }

    /// Rows within the page plus the total independent of the page.
    pub fn batch(&self) -> RepoResult<Batch<T>> {
        let total = self.count()?;
        let rows = self.all()?;
        Ok(Batch { rows, total })
    }

    fn builder(&self) -> SelectBuilder<'_> {
        SelectBuilder::for_record::<T>()
            .joins(&self.joins)
            .filter(&self.filter)
            .order_by(&self.order_by)
            .group_by(self.group_by.as_deref())
    }

    pub(crate) fn load_preloads(&self, rows: &mut [T]) -> RepoResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        for relation in &self.preloads {
            debug!(
                "event=repo_preload module=repo table={} relation={} rows={}",
                T::TABLE,
                relation,
                rows.len()
            );
            T::load_relation(self.conn, rows, relation)?;
        }
        Ok(())
    }
}

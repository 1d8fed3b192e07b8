//! SELECT statement rendering for record reads.
//!
//! # Invariants
//! - Selected columns are table-qualified and aliased back to their bare
//!   names, so `Record::from_row` reads by name even with joins applied.
//! - The count statement wraps the same filtered/grouped query without
//!   ordering or pagination, so totals are independent of the page.
//! - Joined reads without `GROUP BY` select `DISTINCT` record columns, so a
//!   one-to-many join yields each record once and counts it once.

use super::filter::{Filter, OrderBy, Page};
use super::ident::{qualify, quote_identifier};
use crate::model::record::Record;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;

/// Rendered SQL plus positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Borrowing builder over one record type's table.
#[derive(Debug, Clone)]
pub struct SelectBuilder<'q> {
    table: &'static str,
    primary_key: &'static str,
    columns: &'static [&'static str],
    joins: &'q [String],
    filter: Option<&'q Filter>,
    order_by: &'q [OrderBy],
    group_by: Option<&'q str>,
    page: Page,
    order_by_primary_key: bool,
}

impl<'q> SelectBuilder<'q> {
    pub fn for_record<T: Record>() -> Self {
        Self {
            table: T::TABLE,
            primary_key: T::PRIMARY_KEY,
            columns: T::columns(),
            joins: &[],
            filter: None,
            order_by: &[],
            group_by: None,
            page: Page::default(),
            order_by_primary_key: false,
        }
    }

    pub fn joins(mut self, joins: &'q [String]) -> Self {
        self.joins = joins;
        self
    }

    pub fn filter(mut self, filter: &'q Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order_by: &'q [OrderBy]) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn group_by(mut self, clause: Option<&'q str>) -> Self {
        self.group_by = clause;
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// Orders by primary key when no explicit ordering is set.
    pub fn primary_key_fallback(mut self) -> Self {
        self.order_by_primary_key = true;
        self
    }

    pub fn build(&self) -> RepoResult<Statement> {
        let mut statement = self.base()?;
        self.push_order(&mut statement.sql)?;
        self.push_page(&mut statement);
        Ok(statement)
    }

    pub fn build_count(&self) -> RepoResult<Statement> {
        let base = self.base()?;
        Ok(Statement {
            sql: format!("SELECT COUNT(*) FROM ({}) AS counted", base.sql),
            params: base.params,
        })
    }

    fn base(&self) -> RepoResult<Statement> {
        let table = quote_identifier(self.table)?;
        let mut selected = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            selected.push(format!(
                "{} AS {}",
                qualify(self.table, column)?,
                quote_identifier(column)?
            ));
        }

        let distinct = if !self.joins.is_empty() && self.group_by.is_none() {
            "DISTINCT "
        } else {
            ""
        };
        let mut sql = format!("SELECT {distinct}{} FROM {table}", selected.join(", "));
        for join in self.joins {
            sql.push(' ');
            sql.push_str(join.trim());
        }

        let mut params = Vec::new();
        if let Some(filter) = self.filter {
            let clauses = render_filter(self.table, filter, &mut params)?;
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
        }

        if let Some(group) = self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group.trim());
        }

        Ok(Statement { sql, params })
    }

    fn push_order(&self, sql: &mut String) -> RepoResult<()> {
        let mut terms = Vec::with_capacity(self.order_by.len());
        for order in self.order_by {
            match order {
                OrderBy::Column { column, direction } => {
                    terms.push(format!("{} {}", qualify(self.table, column)?, direction.as_sql()));
                }
                OrderBy::Raw(clause) => terms.push(clause.trim().to_string()),
            }
        }
        if terms.is_empty() && self.order_by_primary_key {
            terms.push(format!("{} ASC", qualify(self.table, self.primary_key)?));
        }
        if !terms.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }
        Ok(())
    }

    fn push_page(&self, statement: &mut Statement) {
        match self.page.limit {
            Some(limit) => {
                statement.sql.push_str(" LIMIT ?");
                statement.params.push(Value::Integer(i64::from(limit)));
                if self.page.offset > 0 {
                    statement.sql.push_str(" OFFSET ?");
                    statement
                        .params
                        .push(Value::Integer(i64::from(self.page.offset)));
                }
            }
            None if self.page.offset > 0 => {
                statement.sql.push_str(" LIMIT -1 OFFSET ?");
                statement
                    .params
                    .push(Value::Integer(i64::from(self.page.offset)));
            }
            None => {}
        }
    }
}

fn render_filter(table: &str, filter: &Filter, params: &mut Vec<Value>) -> RepoResult<Vec<String>> {
    let mut clauses = Vec::new();

    if let Some(condition) = &filter.condition {
        let condition = condition.trim();
        if !condition.is_empty() {
            clauses.push(format!("({condition})"));
        }
    }

    for (field, value) in &filter.fields {
        let column = qualify(table, field)?;
        if *value == Value::Null {
            clauses.push(format!("{column} IS NULL"));
        } else {
            clauses.push(format!("{column} = ?"));
            params.push(value.clone());
        }
    }

    if let Some(search) = &filter.search {
        if search.columns.is_empty() {
            return Err(RepoError::InvalidQuery(
                "search requires at least one column".to_string(),
            ));
        }
        if !search.term.is_empty() {
            let pattern = search.like_pattern();
            let mut alternatives = Vec::with_capacity(search.columns.len());
            for column in &search.columns {
                alternatives.push(format!("{} LIKE ? ESCAPE '\\'", qualify(table, column)?));
                params.push(Value::Text(pattern.clone()));
            }
            clauses.push(format!("({})", alternatives.join(" OR ")));
        }
    }

    Ok(clauses)
}

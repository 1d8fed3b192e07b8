//! Filter, ordering and pagination inputs for repository reads.
//!
//! # Responsibility
//! - Model the parameters every "find many" operation accepts.
//! - Keep caller-facing inputs independent from SQL rendering.
//!
//! # Invariants
//! - `Fields` iterates in key order so rendered SQL is deterministic.
//! - Raw clauses are carried verbatim; the caller owns their safety.

use rusqlite::types::Value;
use std::collections::BTreeMap;

/// Field/value equality map. `Value::Null` matches `IS NULL`.
pub type Fields = BTreeMap<String, Value>;

/// Builds a `Fields` map from `(name, value)` pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses `asc` / `desc`, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    /// Validated column, qualified with the record table when bare.
    Column {
        column: String,
        direction: SortDirection,
    },
    /// Passed through verbatim.
    Raw(String),
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self::Column {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::Column {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn raw(clause: impl Into<String>) -> Self {
        Self::Raw(clause.into())
    }
}

/// Substring search over one or more text columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    pub columns: Vec<String>,
    pub term: String,
}

impl Search {
    pub fn new<I, S>(columns: I, term: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            term: term.into(),
        }
    }

    /// `%term%` with LIKE metacharacters escaped by `\`.
    pub(crate) fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.term.len() + 2);
        pattern.push('%');
        for ch in self.term.chars() {
            if matches!(ch, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        pattern
    }
}

/// `WHERE` composition: raw condition, equality fields and search, joined by `AND`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub condition: Option<String>,
    pub fields: Fields,
    pub search: Option<Search>,
}

impl Filter {
    pub fn condition(condition: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            ..Self::default()
        }
    }

    pub fn fields(fields: Fields) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn field(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::fields(fields([(name.into(), value.into())]))
    }

    pub fn with_search(mut self, search: Search) -> Self {
        self.search = Some(search);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.condition.is_none() && self.fields.is_empty() && self.search.is_none()
    }
}

/// Limit/offset window. `limit: None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Everything a batch read can carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchQuery {
    pub filter: Filter,
    pub page: Page,
    pub order_by: Vec<OrderBy>,
    /// Raw `GROUP BY` clause body.
    pub group_by: Option<String>,
    /// Replaces the repository's default join clauses when set.
    pub joins: Option<Vec<String>>,
    /// Replaces the repository's default preloads when non-empty.
    pub preloads: Vec<String>,
}

impl BatchQuery {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
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

    pub fn joins<I, S>(mut self, joins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.joins = Some(joins.into_iter().map(Into::into).collect());
        self
    }

    pub fn preload(mut self, relation: impl Into<String>) -> Self {
        self.preloads.push(relation.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{fields, Filter, Search, SortDirection};
    use rusqlite::types::Value;

    #[test]
    fn sort_direction_parses_case_insensitively() {
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse(" asc "), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("up"), None);
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        let search = Search::new(["name"], r"50%_off\");
        assert_eq!(search.like_pattern(), r"%50\%\_off\\%");
    }

    #[test]
    fn fields_are_sorted_by_name() {
        let map = fields([("b", Value::from(2)), ("a", Value::from(1))]);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn empty_filter_reports_empty() {
        assert!(Filter::default().is_empty());
        assert!(!Filter::condition("1 = 1").is_empty());
    }
}

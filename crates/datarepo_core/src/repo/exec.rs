//! Statement execution with per-statement debug logging.
//!
//! Every statement the repository runs goes through this module and is
//! logged as one `event=repo_query` line.

use crate::logging::sanitize_message;
use crate::model::record::Record;
use crate::query::Statement;
use crate::repo::error::{handle_error, RepoResult};
use log::{debug, error};
use rusqlite::{params_from_iter, Connection};
use std::time::Instant;

const MAX_LOGGED_SQL_CHARS: usize = 512;

/// Runs a SELECT and decodes every row as `T`.
pub(crate) fn query_rows<T: Record>(
    conn: &Connection,
    op: &'static str,
    statement: &Statement,
) -> RepoResult<Vec<T>> {
    let started_at = Instant::now();
    let result = (|| -> rusqlite::Result<Vec<T>> {
        let mut stmt = conn.prepare(&statement.sql)?;
        let rows = stmt.query_map(params_from_iter(statement.params.iter()), |row| {
            T::from_row(row)
        })?;
        rows.collect()
    })();

    log_outcome(T::TABLE, op, statement, started_at, result.as_ref().map(Vec::len));
    Ok(result?)
}

/// Runs a SELECT expected to yield at most one interesting row.
///
/// No matching row is success (`None`), not an error.
pub(crate) fn query_first<T: Record>(
    conn: &Connection,
    op: &'static str,
    statement: &Statement,
) -> RepoResult<Option<T>> {
    let started_at = Instant::now();
    let result = conn.query_row(
        &statement.sql,
        params_from_iter(statement.params.iter()),
        |row| T::from_row(row),
    );

    let outcome = match &result {
        Ok(_) => Ok(1),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(err) => Err(err),
    };
    log_outcome(T::TABLE, op, statement, started_at, outcome);
    handle_error(result)
}

/// Runs a single-value `COUNT(*)` statement.
pub(crate) fn query_count(
    conn: &Connection,
    table: &'static str,
    op: &'static str,
    statement: &Statement,
) -> RepoResult<u64> {
    let started_at = Instant::now();
    let result = conn.query_row(
        &statement.sql,
        params_from_iter(statement.params.iter()),
        |row| row.get::<_, i64>(0),
    );

    log_outcome(table, op, statement, started_at, result.as_ref().map(|_| 1));
    let count = result?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Runs a mutation and returns the number of affected rows.
pub(crate) fn execute(
    conn: &Connection,
    table: &'static str,
    op: &'static str,
    statement: &Statement,
) -> RepoResult<usize> {
    let started_at = Instant::now();
    let result = conn.execute(&statement.sql, params_from_iter(statement.params.iter()));

    log_outcome(table, op, statement, started_at, result.as_ref().copied());
    Ok(result?)
}

fn log_outcome(
    table: &str,
    op: &str,
    statement: &Statement,
    started_at: Instant,
    outcome: Result<usize, &rusqlite::Error>,
) {
    let sql = sanitize_message(&statement.sql, MAX_LOGGED_SQL_CHARS);
    let duration_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok(rows) => debug!(
            "event=repo_query module=repo table={table} op={op} status=ok rows={rows} duration_ms={duration_ms} sql={sql}"
        ),
        Err(err) => error!(
            "event=repo_query module=repo table={table} op={op} status=error duration_ms={duration_ms} error={err} sql={sql}"
        ),
    }
}

//! SQL identifier validation and quoting.
//!
//! Only names that pass `IDENTIFIER_RE` are ever interpolated into SQL by
//! the builder. Raw clauses bypass this module on purpose.

use crate::repo::error::{RepoError, RepoResult};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("valid identifier regex")
});

/// Validates `name` (`column` or `table.column`) and double-quotes each part.
pub fn quote_identifier(name: &str) -> RepoResult<String> {
    if !IDENTIFIER_RE.is_match(name) {
        return Err(RepoError::InvalidIdentifier(name.to_string()));
    }
    Ok(name
        .split('.')
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join("."))
}

/// Quotes `field`, prefixing unqualified names with `table`.
///
/// Qualification keeps default joins from making plain field names ambiguous.
pub fn qualify(table: &str, field: &str) -> RepoResult<String> {
    if field.contains('.') {
        return quote_identifier(field);
    }
    Ok(format!(
        "{}.{}",
        quote_identifier(table)?,
        quote_identifier(field)?
    ))
}

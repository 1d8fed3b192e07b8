//! Generic data-access layer over SQLite.
//! Record types describe their table; repositories translate CRUD and query
//! calls into SQL on a borrowed `rusqlite::Connection`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;

pub use config::{Config, ConfigError, DbConfig, LogConfig};
pub use db::migrations::Migration;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::Record;
pub use query::{fields, BatchQuery, Fields, Filter, OrderBy, Page, Search, SortDirection};
pub use repo::error::{handle_error, handle_one_error, RepoError, RepoResult};
pub use repo::repository::{Batch, Repository, TransactionRepository};
pub use repo::scoped::ScopedQuery;
pub use repo::sqlite_repo::{Associations, SqliteRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

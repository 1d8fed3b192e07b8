//! Generic repository layer over a borrowed SQLite connection.
//!
//! # Responsibility
//! - Define the base and transactional repository contracts.
//! - Translate each call into SQL and normalize its outcome.
//!
//! # Invariants
//! - Absence on non-strict reads is success; strict reads report the
//!   `RecordNotFound` sentinel instead of a database error.
//! - Every other database failure surfaces as `RepoError::Db`.

pub mod error;
mod exec;
pub mod repository;
pub mod scoped;
pub mod sqlite_repo;

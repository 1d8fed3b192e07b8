//! Record model shared by every repository instance.
//!
//! # Responsibility
//! - Define the contract caller-owned row types implement.
//!
//! # Invariants
//! - The repository layer never owns a schema; record types describe it.

pub mod record;

//! Query inputs and SQL rendering.
//!
//! # Responsibility
//! - Translate filters, ordering, grouping and pagination into SQL text
//!   plus bind values.
//!
//! # Invariants
//! - Every interpolated name passes identifier validation.
//! - Caller values are always bound, never interpolated.

pub mod builder;
pub mod filter;
pub mod ident;

pub use builder::{SelectBuilder, Statement};
pub use filter::{fields, BatchQuery, Fields, Filter, OrderBy, Page, Search, SortDirection};

//! Document collection boundary.
//!
//! This module defines an infrastructure-facing abstraction for storing and
//! querying documents of one record type, plus in-memory and Postgres
//! implementations.

pub mod filter;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use filter::{CompiledFilter, Filter};
pub use in_memory::InMemoryEntityStore;
pub use postgres::PostgresEntityStore;
pub use r#trait::{EntityStore, Page, PageRequest, StoreError};

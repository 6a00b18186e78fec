//! Transactional bulk-insert stores for the user-seeder workspace.
//!
//! - [`SeedStore`] - one exclusive connection with a transaction boundary
//! - [`StoreConnector`] - hands every worker its own [`SeedStore`]
//! - [`PostgresConnector`] / [`PostgresStore`] - `tokio-postgres` backend
//! - [`MemoryDatabase`] / [`MemoryStore`] - in-memory backend for dry runs
//!   and tests

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::StoreError;
pub use memory::{FailurePlan, MemoryDatabase, MemoryStore};
pub use postgres::{PostgresConnector, PostgresStore};
pub use store::{SeedStore, StoreConnector, TableRows};

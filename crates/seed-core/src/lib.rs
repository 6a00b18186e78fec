//! Core types for the user-seeder workspace.
//!
//! This crate provides the foundational types shared by the generator,
//! store and worker crates:
//!
//! - [`UserRecord`] / [`AddressRecord`] - one row of each seeded table
//! - [`SeedRecord`] - the user/address pair produced for one dataset row
//! - [`Table`] - the two tables written by every batch
//! - [`Partition`] - the slice of the total work owned by one worker
//!
//! # Architecture
//!
//! ```text
//! seed-core (this crate)
//!    │
//!    ├─── seed-generator    (produces SeedRecords for a Partition)
//!    ├─── seed-store        (bulk-inserts UserRecords / AddressRecords)
//!    ├─── seed-populate     (batches SeedRecords into transactions)
//!    └─── seed-distributed  (plans Partitions, runs workers)
//! ```

pub mod partition;
pub mod records;

pub use partition::Partition;
pub use records::{AddressRecord, SeedRecord, Table, UserRecord, DEFAULT_PASSWORD_HASH};

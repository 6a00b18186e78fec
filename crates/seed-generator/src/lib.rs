//! Record generation for the user-seeder workspace.
//!
//! This crate turns a worker's [`Partition`](seed_core::Partition) into a
//! stream of [`SeedRecord`](seed_core::SeedRecord)s, either synthesized from
//! a seeded RNG or mapped from the rows of an external CSV dataset.
//!
//! # Architecture
//!
//! ```text
//!   RecordSourceConfig ──► open_source(partition)
//!          │
//!          ├── Synthetic ─► SyntheticSource  (Range partition, StdRng per worker)
//!          │
//!          └── Csv ───────► CsvSource        (Modulo partition, csv::Reader)
//!                                │
//!                                ▼
//!               Iterator<Item = Result<SeedRecord, RecordError>>
//! ```
//!
//! # Example
//!
//! ```rust
//! use seed_core::Partition;
//! use seed_generator::{open_source, RecordSourceConfig, SourceOptions};
//!
//! let config = RecordSourceConfig::Synthetic { seed: Some(42) };
//! let partition = Partition::Range { start: 0, end: 3 };
//! let source = open_source(&config, partition, SourceOptions::default()).unwrap();
//! assert_eq!(source.count(), 3);
//! ```

pub mod csv_source;
pub mod error;
pub mod generators;
pub mod source;
pub mod synthetic;

pub use csv_source::{CsvLayout, CsvRecordMapper, CsvSource};
pub use error::{ParseError, RecordError};
pub use source::{open_source, RecordSource, RecordSourceConfig, SourceOptions};
pub use synthetic::{SyntheticGenerator, SyntheticSource};

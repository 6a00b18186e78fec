//! Seeding workers for the user-seeder workspace.
//!
//! A [`Worker`] owns one partition and one store connection. It pulls
//! records from its source and hands them to a [`BatchWriter`], which
//! commits every full batch of users and their addresses in a single
//! transaction. The outcome is summarized in a [`WorkerReport`].

pub mod batch;
pub mod error;
pub mod report;
pub mod worker;

pub use batch::{Batch, BatchWriter, WriterStats, DEFAULT_BATCH_SIZE};
pub use error::{FailureKind, WorkerError, WorkerFailure};
pub use report::{worker_id, WorkerProgress, WorkerReport, WorkerState};
pub use worker::{Worker, WorkerConfig, MAX_REPORTED_WARNINGS};

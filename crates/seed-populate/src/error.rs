//! Error types for seeding workers.

use seed_generator::RecordError;
use seed_store::StoreError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that terminate a worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The record source failed or a row was malformed in strict mode.
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// The store rejected a connection or a batch.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The worker ran past its time budget.
    #[error("Worker exceeded its timeout of {0:?}")]
    Timeout(Duration),

    /// A worker child process could not be run or reported nothing.
    #[error("Worker process error: {0}")]
    Process(String),
}

impl WorkerError {
    pub fn kind(&self) -> FailureKind {
        match self {
            WorkerError::Record(RecordError::Parse(_)) => FailureKind::Parse,
            WorkerError::Record(_) => FailureKind::Source,
            WorkerError::Store(_) => FailureKind::Store,
            WorkerError::Timeout(_) => FailureKind::Timeout,
            WorkerError::Process(_) => FailureKind::Process,
        }
    }
}

/// Category of a worker failure, as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Parse,
    Source,
    Store,
    Timeout,
    Process,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Parse => "parse",
            FailureKind::Source => "source",
            FailureKind::Store => "store",
            FailureKind::Timeout => "timeout",
            FailureKind::Process => "process",
        };
        f.write_str(name)
    }
}

/// Serializable description of why a worker failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&WorkerError> for WorkerFailure {
    fn from(err: &WorkerError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

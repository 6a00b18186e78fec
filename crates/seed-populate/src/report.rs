//! Per-worker outcome reporting.

use crate::error::WorkerFailure;
use chrono::{DateTime, Utc};
use seed_core::Partition;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lifecycle of a worker.
///
/// `Init → Generating ⇄ Batching → Draining → Done`, or `Failed` from any
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Init,
    Generating,
    Batching,
    Draining,
    Done,
    Failed,
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Done | WorkerState::Failed)
    }

    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Init, Generating)
            | (Generating, Batching)
            | (Batching, Generating)
            | (Generating, Draining) => true,
            (Draining, Done) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Init => "init",
            WorkerState::Generating => "generating",
            WorkerState::Batching => "batching",
            WorkerState::Draining => "draining",
            WorkerState::Done => "done",
            WorkerState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Live counters a worker publishes after every committed batch.
///
/// The orchestrator keeps a clone so it can still report committed rows for
/// a worker it had to cancel.
#[derive(Debug, Clone, Default)]
pub struct WorkerProgress {
    inner: Arc<ProgressCounters>,
}

#[derive(Debug, Default)]
struct ProgressCounters {
    rows_committed: AtomicU64,
    batches_committed: AtomicU64,
    rows_skipped: AtomicU64,
}

impl WorkerProgress {
    pub fn record_batch(&self, rows: u64) {
        self.inner.rows_committed.fetch_add(rows, Ordering::Relaxed);
        self.inner.batches_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.inner.rows_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rows_committed(&self) -> u64 {
        self.inner.rows_committed.load(Ordering::Relaxed)
    }

    pub fn batches_committed(&self) -> u64 {
        self.inner.batches_committed.load(Ordering::Relaxed)
    }

    pub fn rows_skipped(&self) -> u64 {
        self.inner.rows_skipped.load(Ordering::Relaxed)
    }
}

/// Complete worker output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Worker identifier (`worker-<index>`)
    pub worker_id: String,
    pub worker_index: usize,
    /// Work the worker owned
    pub partition: Partition,
    /// Host the worker ran on
    pub hostname: String,
    /// OS process id of the worker
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Final state, `Done` or `Failed`
    pub state: WorkerState,
    /// Pairs committed (each one user and one address)
    pub rows_committed: u64,
    pub batches_committed: u64,
    /// Malformed rows skipped
    pub rows_skipped: u64,
    /// Non-fatal problems, capped
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<WorkerFailure>,
}

impl WorkerReport {
    /// Report for a worker that ended without producing its own report.
    pub fn failed(
        worker_index: usize,
        partition: Partition,
        started_at: DateTime<Utc>,
        progress: &WorkerProgress,
        failure: WorkerFailure,
    ) -> Self {
        Self {
            worker_id: worker_id(worker_index),
            worker_index,
            partition,
            hostname: local_hostname(),
            pid: std::process::id(),
            started_at,
            completed_at: Utc::now(),
            state: WorkerState::Failed,
            rows_committed: progress.rows_committed(),
            batches_committed: progress.batches_committed(),
            rows_skipped: progress.rows_skipped(),
            warnings: Vec::new(),
            failure: Some(failure),
        }
    }

    pub fn success(&self) -> bool {
        self.state == WorkerState::Done
    }

    /// Get duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Calculate rows per second.
    pub fn rows_per_second(&self) -> f64 {
        let secs = self.duration_secs();
        if secs > 0.0 {
            self.rows_committed as f64 / secs
        } else {
            0.0
        }
    }
}

pub fn worker_id(index: usize) -> String {
    format!("worker-{index}")
}

pub(crate) fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

//! Run configuration and its validation.

use crate::partitioner::RemainderPolicy;
use chrono::{DateTime, Utc};
use seed_core::{Partition, DEFAULT_PASSWORD_HASH};
use seed_generator::{CsvLayout, RecordSourceConfig, SourceOptions};
use seed_populate::{WorkerConfig, DEFAULT_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default per-worker timeout (one hour).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Problems detected before any worker is started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Worker count must be greater than zero")]
    InvalidWorkerCount,

    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("Worker index {index} is out of range for {workers} workers")]
    WorkerIndexOutOfRange { index: usize, workers: usize },

    #[error("Synthetic mode requires --total")]
    MissingTotal,

    #[error("CSV mode requires --source")]
    MissingSource,

    #[error("CSV source {0:?} does not exist")]
    SourceNotFound(PathBuf),

    #[error("Total {total} does not divide evenly across {workers} workers")]
    UnevenPartition { total: u64, workers: usize },

    #[error("The PostgreSQL store requires --database-url or DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Timeout must be greater than zero")]
    InvalidTimeout,

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("The memory store cannot be shared by worker processes")]
    MemoryStoreInProcessMode,
}

/// Where records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeedMode {
    Synthetic,
    Csv,
}

impl std::fmt::Display for SeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedMode::Synthetic => f.write_str("synthetic"),
            SeedMode::Csv => f.write_str("csv"),
        }
    }
}

/// How workers are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IsolationMode {
    /// Tokio tasks inside this process
    #[default]
    Task,
    /// Child processes of the current executable
    Process,
}

/// Which store the workers write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StoreKind {
    #[default]
    Postgres,
    /// In-process store, for dry runs
    Memory,
}

/// Validated description of a seeding run.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub mode: SeedMode,
    pub workers: usize,
    pub batch_size: usize,
    /// Synthetic record count
    pub total: Option<u64>,
    /// CSV dataset path
    pub source: Option<PathBuf>,
    pub layout: CsvLayout,
    pub remainder: RemainderPolicy,
    pub strict: bool,
    /// Base RNG seed; worker `i` uses `seed + i`
    pub seed: Option<u64>,
    pub timeout: Duration,
    pub isolation: IsolationMode,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub create_tables: bool,
    pub password_hash: String,
    /// `created_at` for every record of the run; taken at start when unset
    pub clock: Option<DateTime<Utc>>,
}

impl SeedConfig {
    /// Synthetic run with defaults for everything but the essentials.
    pub fn synthetic(workers: usize, total: u64) -> Self {
        Self {
            mode: SeedMode::Synthetic,
            total: Some(total),
            ..Self::base(workers)
        }
    }

    /// CSV run with the default column layout.
    pub fn csv(workers: usize, source: impl Into<PathBuf>) -> Self {
        Self {
            mode: SeedMode::Csv,
            source: Some(source.into()),
            ..Self::base(workers)
        }
    }

    fn base(workers: usize) -> Self {
        Self {
            mode: SeedMode::Synthetic,
            workers,
            batch_size: DEFAULT_BATCH_SIZE,
            total: None,
            source: None,
            layout: CsvLayout::default(),
            remainder: RemainderPolicy::default(),
            strict: false,
            seed: None,
            timeout: DEFAULT_TIMEOUT,
            isolation: IsolationMode::default(),
            store: StoreKind::Memory,
            database_url: None,
            create_tables: false,
            password_hash: DEFAULT_PASSWORD_HASH.to_string(),
            clock: None,
        }
    }

    /// Check the configuration and the partition plan it implies.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        match self.mode {
            SeedMode::Synthetic => {
                let total = self.total.ok_or(ConfigError::MissingTotal)?;
                if self.remainder == RemainderPolicy::Strict && total % self.workers as u64 != 0 {
                    return Err(ConfigError::UnevenPartition {
                        total,
                        workers: self.workers,
                    });
                }
            }
            SeedMode::Csv => {
                let path = self.source.as_ref().ok_or(ConfigError::MissingSource)?;
                if !path.is_file() {
                    return Err(ConfigError::SourceNotFound(path.clone()));
                }
            }
        }

        match self.store {
            StoreKind::Postgres if self.database_url.is_none() => {
                return Err(ConfigError::MissingDatabaseUrl);
            }
            StoreKind::Memory if self.isolation == IsolationMode::Process => {
                return Err(ConfigError::MemoryStoreInProcessMode);
            }
            _ => {}
        }

        Ok(())
    }

    /// The run's single timestamp.
    pub fn run_clock(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    /// Record source for worker `index`.
    pub fn record_source(&self, index: usize) -> RecordSourceConfig {
        match self.mode {
            SeedMode::Synthetic => RecordSourceConfig::Synthetic {
                seed: self.seed.map(|s| s.wrapping_add(index as u64)),
            },
            SeedMode::Csv => RecordSourceConfig::Csv {
                path: self.source.clone().unwrap_or_default(),
                layout: self.layout,
            },
        }
    }

    /// Full configuration for worker `index` owning `partition`.
    pub fn worker_config(
        &self,
        index: usize,
        partition: Partition,
        clock: DateTime<Utc>,
    ) -> WorkerConfig {
        WorkerConfig {
            index,
            partition,
            source: self.record_source(index),
            batch_size: self.batch_size,
            strict: self.strict,
            options: SourceOptions {
                clock,
                password_hash: self.password_hash.clone(),
            },
        }
    }
}

/// Parse a duration such as `30m`, `1h`, `90s` or `250ms`. A bare number is
/// seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, 1)
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 3_600_000)
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 60_000)
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 1000)
    } else {
        (s, 1000)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidDuration(s.to_string()))?;

    num.checked_mul(multiplier)
        .map(Duration::from_millis)
        .ok_or_else(|| ConfigError::InvalidDuration(s.to_string()))
}

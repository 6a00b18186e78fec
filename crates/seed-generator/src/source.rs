//! Opening the record stream for one worker's partition.

use crate::csv_source::{CsvLayout, CsvRecordMapper, CsvSource};
use crate::error::RecordError;
use crate::synthetic::{SyntheticGenerator, SyntheticSource};
use chrono::{DateTime, Utc};
use seed_core::{SeedRecord, DEFAULT_PASSWORD_HASH};
use std::path::PathBuf;

/// Stream of records for a single partition.
pub type RecordSource = Box<dyn Iterator<Item = Result<SeedRecord, RecordError>> + Send>;

/// Where a worker's records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSourceConfig {
    /// Random users; `seed` is the worker's own RNG seed.
    Synthetic { seed: Option<u64> },
    /// Rows of an external CSV dataset.
    Csv { path: PathBuf, layout: CsvLayout },
}

/// Values shared by every record a source produces.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub clock: DateTime<Utc>,
    pub password_hash: String,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            clock: Utc::now(),
            password_hash: DEFAULT_PASSWORD_HASH.to_string(),
        }
    }
}

/// Open the record stream for `partition`.
pub fn open_source(
    config: &RecordSourceConfig,
    partition: seed_core::Partition,
    options: SourceOptions,
) -> Result<RecordSource, RecordError> {
    match config {
        RecordSourceConfig::Synthetic { seed } => {
            let generator = SyntheticGenerator::new(*seed)
                .with_clock(options.clock)
                .with_password_hash(options.password_hash);
            Ok(Box::new(SyntheticSource::new(generator, partition)?))
        }
        RecordSourceConfig::Csv { path, layout } => {
            let mapper = CsvRecordMapper::new(*layout)
                .with_clock(options.clock)
                .with_password_hash(options.password_hash);
            Ok(Box::new(CsvSource::open(path, mapper, partition)?))
        }
    }
}

//! A single seeding worker: one partition, one store connection.

use crate::batch::{BatchWriter, WriterStats};
use crate::error::{WorkerError, WorkerFailure};
use crate::report::{local_hostname, worker_id, WorkerProgress, WorkerReport, WorkerState};
use chrono::Utc;
use seed_core::{Partition, SeedRecord};
use seed_generator::{
    open_source, ParseError, RecordError, RecordSource, RecordSourceConfig, SourceOptions,
};
use seed_store::StoreConnector;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Skipped-row messages kept in a report before further ones are only counted.
pub const MAX_REPORTED_WARNINGS: usize = 100;

/// Everything a worker needs to run.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub index: usize,
    pub partition: Partition,
    pub source: RecordSourceConfig,
    pub batch_size: usize,
    /// Fail on the first malformed row instead of skipping it.
    pub strict: bool,
    pub options: SourceOptions,
}

/// Drives records from the worker's source through a [`BatchWriter`].
pub struct Worker {
    config: WorkerConfig,
    state: WorkerState,
    progress: WorkerProgress,
    warnings: Vec<String>,
}

impl Worker {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            state: WorkerState::Init,
            progress: WorkerProgress::default(),
            warnings: Vec::new(),
        }
    }

    /// Handle to the worker's live counters.
    pub fn progress(&self) -> WorkerProgress {
        self.progress.clone()
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run the worker to completion against a fresh connection from
    /// `connector`. Never returns an error: failures end up in the report.
    pub async fn run<C: StoreConnector>(mut self, connector: &C) -> WorkerReport {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            "Worker {} starting: {} (batch size {}, store {})",
            self.config.index,
            self.config.partition,
            self.config.batch_size,
            connector.name()
        );

        let failure = match self.execute(connector).await {
            Ok(stats) => {
                self.transition(WorkerState::Done);
                info!(
                    "Worker {} done: {} rows in {} batches, {} skipped, {:.2}s",
                    self.config.index,
                    stats.rows_committed,
                    stats.batches_committed,
                    self.progress.rows_skipped(),
                    start.elapsed().as_secs_f64()
                );
                None
            }
            Err(e) => {
                self.transition(WorkerState::Failed);
                error!(
                    "Worker {} failed after {} committed rows: {}",
                    self.config.index,
                    self.progress.rows_committed(),
                    e
                );
                Some(WorkerFailure::from(&e))
            }
        };

        WorkerReport {
            worker_id: worker_id(self.config.index),
            worker_index: self.config.index,
            partition: self.config.partition,
            hostname: local_hostname(),
            pid: std::process::id(),
            started_at,
            completed_at: Utc::now(),
            state: self.state,
            rows_committed: self.progress.rows_committed(),
            batches_committed: self.progress.batches_committed(),
            rows_skipped: self.progress.rows_skipped(),
            warnings: self.warnings,
            failure,
        }
    }

    async fn execute<C: StoreConnector>(
        &mut self,
        connector: &C,
    ) -> Result<WriterStats, WorkerError> {
        let mut source = open_source(
            &self.config.source,
            self.config.partition,
            self.config.options.clone(),
        )?;
        let store = connector.connect().await?;
        let mut writer = BatchWriter::new(store, self.config.batch_size);

        self.transition(WorkerState::Generating);

        loop {
            // Sources generate or read from disk synchronously, so each batch
            // is filled on the blocking pool and the async side stays
            // cancellable.
            let capacity = writer.batch_size() - writer.pending();
            let strict = self.config.strict;
            let (returned, chunk) = tokio::task::spawn_blocking(move || {
                let chunk = read_chunk(&mut source, capacity, strict);
                (source, chunk)
            })
            .await
            .map_err(|e| WorkerError::Process(format!("record source task failed: {e}")))?;
            source = returned;

            for e in chunk.skipped {
                warn!("Worker {} skipping row: {}", self.config.index, e);
                self.progress.record_skip();
                if self.warnings.len() < MAX_REPORTED_WARNINGS {
                    self.warnings.push(e.to_string());
                }
            }

            let mut full = false;
            for record in chunk.records {
                full = writer.push(record);
            }
            if let Some(e) = chunk.error {
                return Err(e.into());
            }

            if full {
                self.transition(WorkerState::Batching);
                let rows = writer.flush().await?;
                self.progress.record_batch(rows as u64);
                self.transition(WorkerState::Generating);
            }
            if chunk.exhausted {
                break;
            }
        }

        self.transition(WorkerState::Draining);
        let rows = writer.flush().await?;
        if rows > 0 {
            self.progress.record_batch(rows as u64);
        }

        Ok(writer.stats().clone())
    }

    fn transition(&mut self, next: WorkerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal worker transition {} -> {}",
            self.state,
            next
        );
        debug!("Worker {}: {} -> {}", self.config.index, self.state, next);
        self.state = next;
    }
}

/// Records read from a source in one blocking step.
#[derive(Default)]
struct Chunk {
    records: Vec<SeedRecord>,
    /// Malformed rows passed over in lenient mode
    skipped: Vec<ParseError>,
    /// Error that ends the worker
    error: Option<RecordError>,
    exhausted: bool,
}

/// Read until `capacity` records are collected, the source ends or a fatal
/// error occurs.
fn read_chunk(source: &mut RecordSource, capacity: usize, strict: bool) -> Chunk {
    let mut chunk = Chunk {
        records: Vec::with_capacity(capacity),
        ..Chunk::default()
    };

    while chunk.records.len() < capacity {
        match source.next() {
            None => {
                chunk.exhausted = true;
                break;
            }
            Some(Ok(record)) => chunk.records.push(record),
            Some(Err(RecordError::Parse(e))) if !strict => chunk.skipped.push(e),
            Some(Err(e)) => {
                chunk.error = Some(e);
                break;
            }
        }
    }

    chunk
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use seed_generator::CsvLayout;
    use seed_store::{FailurePlan, MemoryDatabase};
    use std::collections::HashSet;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn layout() -> CsvLayout {
        CsvLayout {
            first_name: 1,
            last_name: 2,
            email: 3,
            street: 4,
            country: 5,
            city: 6,
            post_code: 7,
        }
    }

    fn write_csv(rows: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,first,last,email,street,country,city,zip").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn good_row(i: usize) -> String {
        format!("{i},First{i},Last{i},user{i}@example.com,{i} Main St,Country,City,{i:05}")
    }

    fn synthetic(index: usize, start: u64, end: u64, batch_size: usize) -> WorkerConfig {
        WorkerConfig {
            index,
            partition: Partition::Range { start, end },
            source: RecordSourceConfig::Synthetic { seed: Some(7) },
            batch_size,
            strict: false,
            options: SourceOptions::default(),
        }
    }

    fn csv(file: &NamedTempFile, workers: usize, index: usize, strict: bool) -> WorkerConfig {
        WorkerConfig {
            index,
            partition: Partition::Modulo { workers, index },
            source: RecordSourceConfig::Csv {
                path: file.path().to_path_buf(),
                layout: layout(),
            },
            batch_size: 2,
            strict,
            options: SourceOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_synthetic_worker_commits_partition() {
        let db = MemoryDatabase::new();
        let worker = Worker::new(synthetic(0, 0, 5, 2));
        assert_eq!(worker.state(), WorkerState::Init);

        let report = worker.run(&db).await;

        assert_eq!(report.state, WorkerState::Done);
        assert!(report.success());
        assert_eq!(report.rows_committed, 5);
        assert_eq!(report.batches_committed, 3);
        assert_eq!(db.committed_batches().await, vec![2, 2, 1]);

        let users = db.users().await;
        let user_ids: HashSet<_> = users.iter().map(|u| u.id).collect();
        assert_eq!(user_ids.len(), 5);
        for address in db.addresses().await {
            assert!(user_ids.contains(&address.user_id));
        }
    }

    #[tokio::test]
    async fn test_empty_partition_does_nothing() {
        let db = MemoryDatabase::new();
        let report = Worker::new(synthetic(1, 4, 4, 10)).run(&db).await;

        assert!(report.success());
        assert_eq!(report.rows_committed, 0);
        assert_eq!(db.operation_count().await, 0);
    }

    #[tokio::test]
    async fn test_progress_visible_outside_worker() {
        let db = MemoryDatabase::new();
        let worker = Worker::new(synthetic(0, 0, 4, 2));
        let progress = worker.progress();

        worker.run(&db).await;
        assert_eq!(progress.rows_committed(), 4);
        assert_eq!(progress.batches_committed(), 2);
    }

    #[tokio::test]
    async fn test_malformed_row_skipped_by_default() {
        let file = write_csv(&[good_row(0), "1,short".to_string(), good_row(2)]);
        let db = MemoryDatabase::new();

        let report = Worker::new(csv(&file, 1, 0, false)).run(&db).await;

        assert!(report.success());
        assert_eq!(report.rows_committed, 2);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Row 1"));
    }

    #[tokio::test]
    async fn test_malformed_row_fails_strict_worker() {
        let file = write_csv(&[
            good_row(0),
            good_row(1),
            good_row(2),
            "3,short".to_string(),
            good_row(4),
        ]);
        let db = MemoryDatabase::new();

        let report = Worker::new(csv(&file, 1, 0, true)).run(&db).await;

        assert_eq!(report.state, WorkerState::Failed);
        let failure = report.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Parse);
        // The first full batch stays committed; the buffered row is lost
        assert_eq!(report.rows_committed, 2);
        assert_eq!(db.users().await.len(), 2);
    }

    #[tokio::test]
    async fn test_csv_worker_only_writes_owned_rows() {
        let rows: Vec<_> = (0..6).map(good_row).collect();
        let file = write_csv(&rows);
        let db = MemoryDatabase::new();

        let report = Worker::new(csv(&file, 3, 1, false)).run(&db).await;

        assert_eq!(report.rows_committed, 2);
        let mut emails: Vec<_> = db.users().await.into_iter().map(|u| u.email).collect();
        emails.sort();
        assert_eq!(emails, vec!["user1@example.com", "user4@example.com"]);
    }

    #[tokio::test]
    async fn test_connection_failure_fails_worker() {
        let db = MemoryDatabase::new().with_failures(FailurePlan {
            refuse_connections: true,
            ..FailurePlan::default()
        });

        let report = Worker::new(synthetic(2, 0, 3, 10)).run(&db).await;

        assert_eq!(report.state, WorkerState::Failed);
        assert_eq!(report.failure.unwrap().kind, FailureKind::Store);
        assert_eq!(report.worker_id, "worker-2");
    }

    #[tokio::test]
    async fn test_store_failure_keeps_earlier_batches() {
        let db = MemoryDatabase::new().with_failures(FailurePlan {
            fail_addresses_after_commits: Some(2),
            ..FailurePlan::default()
        });

        let report = Worker::new(synthetic(0, 0, 10, 3)).run(&db).await;

        assert_eq!(report.state, WorkerState::Failed);
        assert_eq!(report.rows_committed, 6);
        assert_eq!(db.users().await.len(), 6);
        assert_eq!(db.addresses().await.len(), 6);
    }

    #[tokio::test]
    async fn test_large_batch_generation_can_be_cancelled() {
        let db = MemoryDatabase::new();
        let worker = Worker::new(synthetic(0, 0, 300_000, 300_000));
        let progress = worker.progress();

        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(1), worker.run(&db)).await;

        assert!(outcome.is_err());
        assert_eq!(progress.rows_committed(), 0);
        assert!(db.users().await.is_empty());
    }

    #[test]
    fn test_read_chunk_stops_at_capacity_and_collects_skips() {
        let file = write_csv(&[
            good_row(0),
            "1,short".to_string(),
            good_row(2),
            good_row(3),
        ]);
        let config = csv(&file, 1, 0, false);
        let mut source = open_source(&config.source, config.partition, config.options).unwrap();

        let chunk = read_chunk(&mut source, 2, false);
        assert_eq!(chunk.records.len(), 2);
        assert_eq!(chunk.skipped.len(), 1);
        assert!(chunk.error.is_none());
        assert!(!chunk.exhausted);

        let chunk = read_chunk(&mut source, 2, false);
        assert_eq!(chunk.records.len(), 1);
        assert!(chunk.exhausted);
    }

    #[tokio::test]
    async fn test_missing_csv_is_source_failure() {
        let config = WorkerConfig {
            index: 0,
            partition: Partition::Modulo {
                workers: 1,
                index: 0,
            },
            source: RecordSourceConfig::Csv {
                path: "/nonexistent/users.csv".into(),
                layout: layout(),
            },
            batch_size: 10,
            strict: false,
            options: SourceOptions::default(),
        };
        let db = MemoryDatabase::new();

        let report = Worker::new(config).run(&db).await;

        assert_eq!(report.failure.unwrap().kind, FailureKind::Source);
        assert_eq!(db.connection_count().await, 0);
    }
}

//! Launching workers, enforcing their timeout and collecting their reports.

use crate::aggregator::{aggregate_reports, RunReport};
use crate::cli::worker_process_args;
use crate::config::{ConfigError, IsolationMode, SeedConfig};
use crate::partitioner::{describe_partitioning, plan_partitions};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use seed_core::{Partition, Table};
use seed_populate::{
    FailureKind, Worker, WorkerError, WorkerFailure, WorkerProgress, WorkerReport,
};
use seed_store::{SeedStore, StoreConnector, StoreError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{error, info, info_span, warn, Instrument};

/// Runs one seeding job across all of its workers.
pub struct Orchestrator {
    config: SeedConfig,
    partitions: Vec<Partition>,
    worker_program: Option<PathBuf>,
}

impl Orchestrator {
    /// Validate `config` and plan the partitions. Nothing is started yet.
    pub fn new(config: SeedConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let partitions =
            plan_partitions(config.mode, config.total, config.workers, config.remainder)?;
        Ok(Self {
            config,
            partitions,
            worker_program: None,
        })
    }

    /// Executable started for each worker in process isolation. Defaults
    /// to the current executable.
    pub fn with_worker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.worker_program = Some(program.into());
        self
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Run every worker to completion or timeout and report the outcome.
    ///
    /// Errors are returned only for problems outside the workers, such as
    /// failing to create the schema. Worker failures are in the report.
    pub async fn run<C>(&self, connector: Arc<C>) -> Result<RunReport>
    where
        C: StoreConnector + 'static,
    {
        let started_at = Utc::now();
        let clock = self.config.run_clock();

        info!(
            "Seeding {} mode with {} workers ({:?} isolation, store {})",
            self.config.mode,
            self.config.workers,
            self.config.isolation,
            connector.name()
        );
        info!("{}", describe_partitioning(&self.partitions));

        if self.config.create_tables {
            let mut store = connector
                .connect()
                .await
                .context("Failed to connect to create tables")?;
            store
                .ensure_schema()
                .await
                .context("Failed to create users and addresses tables")?;
            info!("Tables users and addresses are ready");
        }

        let workers = match self.config.isolation {
            IsolationMode::Task => self.run_tasks(Arc::clone(&connector), clock).await,
            IsolationMode::Process => self.run_processes(clock).await?,
        };

        let mut report = aggregate_reports(self.config.mode, started_at, Utc::now(), workers);

        match store_counts(connector.as_ref()).await {
            Ok((users, addresses)) => {
                report.users_in_store = users;
                report.addresses_in_store = addresses;
                if let Some(users) = users {
                    info!("Total users in store: {}", users);
                }
            }
            Err(e) => warn!("Could not count seeded rows: {}", e),
        }

        info!(
            "Seeding finished: {}/{} workers done, {} rows committed",
            report.completed_workers, report.total_workers, report.total_rows_committed
        );

        Ok(report)
    }

    async fn run_tasks<C>(&self, connector: Arc<C>, clock: DateTime<Utc>) -> Vec<WorkerReport>
    where
        C: StoreConnector + 'static,
    {
        let timeout = self.config.timeout;
        let mut handles = Vec::with_capacity(self.partitions.len());

        for (index, partition) in self.partitions.iter().copied().enumerate() {
            let worker = Worker::new(self.config.worker_config(index, partition, clock));
            let progress = worker.progress();
            let connector = Arc::clone(&connector);

            let handle = tokio::spawn(
                async move {
                    let started_at = Utc::now();
                    let progress = worker.progress();
                    match tokio::time::timeout(timeout, worker.run(connector.as_ref())).await {
                        Ok(report) => report,
                        Err(_) => timed_out(index, partition, started_at, &progress, timeout),
                    }
                }
                .instrument(info_span!("worker", index)),
            );
            handles.push((index, partition, progress, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (index, partition, progress, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => {
                    error!("Worker {} task did not complete: {}", index, e);
                    WorkerReport::failed(
                        index,
                        partition,
                        clock,
                        &progress,
                        WorkerFailure {
                            kind: FailureKind::Process,
                            message: format!("worker task did not complete: {e}"),
                        },
                    )
                }
            };
            reports.push(report);
        }
        reports
    }

    async fn run_processes(&self, clock: DateTime<Utc>) -> Result<Vec<WorkerReport>> {
        let program = match &self.worker_program {
            Some(program) => program.clone(),
            None => std::env::current_exe().context("Failed to locate the current executable")?,
        };
        let report_dir = tempfile::tempdir().context("Failed to create worker report directory")?;
        let mut base_args = worker_process_args(&self.config);
        base_args.push(format!(
            "--clock={}",
            clock.to_rfc3339_opts(SecondsFormat::Nanos, true)
        ));
        let started_at = Utc::now();

        let mut children = Vec::with_capacity(self.partitions.len());
        for (index, partition) in self.partitions.iter().copied().enumerate() {
            let report_path = report_dir.path().join(format!("worker-{index}.json"));

            let mut command = Command::new(&program);
            command
                .args(&base_args)
                .arg(format!("--worker-index={index}"))
                .arg(format!("--report-output={}", report_path.display()))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .kill_on_drop(true);
            if let Some(url) = &self.config.database_url {
                command.env("DATABASE_URL", url);
            }

            let child = command.spawn();
            if child.is_ok() {
                info!("Worker {} started as a child process", index);
            }
            children.push((index, partition, report_path, child));
        }

        // Every child started at the same time, so one deadline bounds them all.
        // A timeout too large to represent never expires.
        let deadline = tokio::time::Instant::now().checked_add(self.config.timeout);
        let no_progress = WorkerProgress::default();
        let mut reports = Vec::with_capacity(children.len());

        for (index, partition, report_path, child) in children {
            let process_failure = |message: String| {
                error!("Worker {} failed: {}", index, message);
                WorkerReport::failed(
                    index,
                    partition,
                    started_at,
                    &no_progress,
                    WorkerFailure::from(&WorkerError::Process(message)),
                )
            };

            let mut child = match child {
                Ok(child) => child,
                Err(e) => {
                    reports.push(process_failure(format!(
                        "failed to spawn {}: {e}",
                        program.display()
                    )));
                    continue;
                }
            };

            let waited = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, child.wait()).await,
                None => Ok(child.wait().await),
            };
            let report = match waited {
                Ok(Ok(status)) => match read_worker_report(&report_path) {
                    Ok(report) => report,
                    Err(e) => {
                        process_failure(format!("exited with {status} without a report: {e:#}"))
                    }
                },
                Ok(Err(e)) => process_failure(format!("could not be awaited: {e}")),
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill worker {} process: {}", index, e);
                    }
                    timed_out(index, partition, started_at, &no_progress, self.config.timeout)
                }
            };
            reports.push(report);
        }

        Ok(reports)
    }
}

/// Run a single worker of `config` and write its report to `report_output`.
///
/// This is the body of a child process in process isolation.
pub async fn run_single_worker<C: StoreConnector>(
    config: &SeedConfig,
    index: usize,
    connector: &C,
    report_output: Option<&Path>,
) -> Result<WorkerReport> {
    let partitions = plan_partitions(config.mode, config.total, config.workers, config.remainder)?;
    let partition = *partitions
        .get(index)
        .ok_or(ConfigError::WorkerIndexOutOfRange {
            index,
            workers: config.workers,
        })?;

    let worker = Worker::new(config.worker_config(index, partition, config.run_clock()));
    let report = worker
        .run(connector)
        .instrument(info_span!("worker", index))
        .await;

    if let Some(path) = report_output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write worker report to {path:?}"))?;
    }

    Ok(report)
}

fn timed_out(
    index: usize,
    partition: Partition,
    started_at: DateTime<Utc>,
    progress: &WorkerProgress,
    timeout: std::time::Duration,
) -> WorkerReport {
    let err = WorkerError::Timeout(timeout);
    error!(
        "Worker {} cancelled after {:?} with {} rows committed",
        index,
        timeout,
        progress.rows_committed()
    );
    WorkerReport::failed(index, partition, started_at, progress, WorkerFailure::from(&err))
}

fn read_worker_report(path: &Path) -> Result<WorkerReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read worker report {path:?}"))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse worker report {path:?}"))
}

async fn store_counts<C: StoreConnector>(
    connector: &C,
) -> Result<(Option<u64>, Option<u64>), StoreError> {
    let mut store = connector.connect().await?;
    let users = store.count(Table::Users).await?;
    let addresses = store.count(Table::Addresses).await?;
    Ok((users, addresses))
}

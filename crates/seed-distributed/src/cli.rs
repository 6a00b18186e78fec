//! CLI argument definitions for the `seed` binary.

use crate::config::{
    parse_duration, ConfigError, IsolationMode, SeedConfig, SeedMode, StoreKind,
};
use crate::partitioner::RemainderPolicy;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use seed_core::DEFAULT_PASSWORD_HASH;
use seed_generator::CsvLayout;
use std::path::PathBuf;

/// Seed the users and addresses tables with N parallel workers.
#[derive(Parser, Debug, Clone)]
#[command(name = "seed")]
#[command(about = "Seed users and addresses in parallel from a CSV dataset or synthetic data")]
#[command(version)]
pub struct SeedArgs {
    /// Where records come from
    #[arg(long, value_enum)]
    pub mode: SeedMode,

    /// Number of workers (defaults to the number of CPUs)
    #[arg(long, short = 'n')]
    pub workers: Option<usize>,

    /// Users (and addresses) per transaction
    #[arg(long, default_value = "1000")]
    pub batch_size: usize,

    /// Number of synthetic users to create
    #[arg(long)]
    pub total: Option<u64>,

    /// Path to the CSV dataset
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Target store
    #[arg(long, value_enum, default_value = "postgres")]
    pub store: StoreKind,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Abort a worker on its first malformed CSV row instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// How synthetic totals that do not divide evenly are handled
    #[arg(long, value_enum, default_value = "last")]
    pub remainder: RemainderPolicy,

    /// Base random seed (workers use seed, seed+1, seed+2, ...)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Per-worker timeout (e.g., "30m", "1h", "300s")
    #[arg(long, default_value = "1h")]
    pub timeout: String,

    /// Run workers as tasks in this process or as child processes
    #[arg(long, value_enum, default_value = "task")]
    pub isolation: IsolationMode,

    /// Create the users and addresses tables if they do not exist
    #[arg(long)]
    pub create_tables: bool,

    /// Password hash stored for every seeded user
    #[arg(long)]
    pub password_hash: Option<String>,

    /// Output format for the final report
    #[arg(long, short = 'f', value_enum, default_value = "table")]
    pub output_format: OutputFormat,

    /// Run only this worker (used by process isolation)
    #[arg(long, hide = true)]
    pub worker_index: Option<usize>,

    /// Where a single worker writes its JSON report
    #[arg(long, hide = true, requires = "worker_index")]
    pub report_output: Option<PathBuf>,

    /// Timestamp shared by every record of the run (RFC 3339)
    #[arg(long, hide = true)]
    pub clock: Option<DateTime<Utc>>,
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

impl SeedArgs {
    /// Build the run configuration. Validation happens separately.
    pub fn to_config(&self) -> Result<SeedConfig, ConfigError> {
        Ok(SeedConfig {
            mode: self.mode,
            workers: self.workers.unwrap_or_else(num_cpus::get),
            batch_size: self.batch_size,
            total: self.total,
            source: self.source.clone(),
            layout: CsvLayout::default(),
            remainder: self.remainder,
            strict: self.strict,
            seed: self.seed,
            timeout: parse_duration(&self.timeout)?,
            isolation: self.isolation,
            store: self.store,
            database_url: self.database_url.clone(),
            create_tables: self.create_tables,
            password_hash: self
                .password_hash
                .clone()
                .unwrap_or_else(|| DEFAULT_PASSWORD_HASH.to_string()),
            clock: self.clock,
        })
    }
}

/// Arguments that make a child process rebuild `config` and run one worker.
///
/// The database URL is not included; children inherit it through
/// `DATABASE_URL` so it never appears in a process listing. The run clock is
/// left to the caller, which appends `--clock` once per run.
pub fn worker_process_args(config: &SeedConfig) -> Vec<String> {
    let timeout = if config.timeout.subsec_millis() == 0 {
        format!("{}s", config.timeout.as_secs())
    } else {
        format!("{}ms", config.timeout.as_millis())
    };
    let mut args = vec![
        format!("--mode={}", config.mode),
        format!("--workers={}", config.workers),
        format!("--batch-size={}", config.batch_size),
        format!("--timeout={timeout}"),
        format!("--password-hash={}", config.password_hash),
    ];

    if let Some(total) = config.total {
        args.push(format!("--total={total}"));
    }
    if let Some(source) = &config.source {
        args.push(format!("--source={}", source.display()));
    }
    if let Some(seed) = config.seed {
        args.push(format!("--seed={seed}"));
    }
    if config.strict {
        args.push("--strict".to_string());
    }
    if config.remainder == RemainderPolicy::Strict {
        args.push("--remainder=strict".to_string());
    }
    if config.store == StoreKind::Memory {
        args.push("--store=memory".to_string());
    }

    args
}

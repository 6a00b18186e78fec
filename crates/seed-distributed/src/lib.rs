//! Parallel seeding of users and addresses.
//!
//! This crate splits a seeding job into static partitions, runs one worker
//! per partition and aggregates what the workers report.
//!
//! ## Architecture
//!
//! ```text
//!   seed --mode=... --workers=N
//!              │
//!              ▼
//!   ┌─────────────────────┐   ConfigError: nothing is started
//!   │ SeedConfig::validate│──────────────────────────────────►
//!   └─────────────────────┘
//!              │ plan_partitions
//!              ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │                    Orchestrator                      │
//!   │   tokio tasks (default) or child processes          │
//!   └─────────────────────────────────────────────────────┘
//!        │              │                    │
//!        ▼              ▼                    ▼
//!   ┌──────────┐   ┌──────────┐         ┌──────────┐
//!   │ worker-0 │   │ worker-1 │   ...   │ worker-N │   one store
//!   │ timeout  │   │ timeout  │         │ timeout  │   connection each
//!   └──────────┘   └──────────┘         └──────────┘
//!        │              │                    │
//!        └──────────────┼────────────────────┘
//!                       ▼ WorkerReport
//!               aggregate_reports ──► RunReport (table / JSON)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use seed_distributed::{format_table, Orchestrator, SeedConfig};
//! use seed_store::MemoryDatabase;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let orchestrator = Orchestrator::new(SeedConfig::synthetic(4, 10_000))?;
//! let report = orchestrator.run(Arc::new(MemoryDatabase::new())).await?;
//! println!("{}", format_table(&report));
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod partitioner;

pub use aggregator::{aggregate_reports, format_json, format_table, RunReport};
pub use cli::{worker_process_args, OutputFormat, SeedArgs};
pub use config::{
    parse_duration, ConfigError, IsolationMode, SeedConfig, SeedMode, StoreKind, DEFAULT_TIMEOUT,
};
pub use orchestrator::{run_single_worker, Orchestrator};
pub use partitioner::{
    csv_partition, describe_partitioning, plan_partitions, synthetic_partition, RemainderPolicy,
};

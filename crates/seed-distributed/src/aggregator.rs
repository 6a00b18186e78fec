//! Aggregation and rendering of worker reports.

use crate::config::SeedMode;
use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use seed_populate::WorkerReport;
use serde::{Deserialize, Serialize};

/// Outcome of a whole seeding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: SeedMode,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Worker reports ordered by worker index
    pub workers: Vec<WorkerReport>,
    pub total_workers: usize,
    pub completed_workers: usize,
    pub failed_workers: usize,
    pub total_rows_committed: u64,
    pub total_batches_committed: u64,
    pub total_rows_skipped: u64,
    pub wall_clock_duration_secs: f64,
    pub aggregate_rows_per_second: f64,
    /// Users in the store after the run, when the store can count them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_in_store: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses_in_store: Option<u64>,
}

impl RunReport {
    /// The run succeeded only if every worker finished.
    pub fn success(&self) -> bool {
        self.total_workers > 0 && self.failed_workers == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

/// Combine worker reports into a run report.
pub fn aggregate_reports(
    mode: SeedMode,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    mut workers: Vec<WorkerReport>,
) -> RunReport {
    workers.sort_by_key(|w| w.worker_index);

    let total_workers = workers.len();
    let completed_workers = workers.iter().filter(|w| w.success()).count();
    let total_rows_committed = workers.iter().map(|w| w.rows_committed).sum();
    let total_batches_committed = workers.iter().map(|w| w.batches_committed).sum();
    let total_rows_skipped = workers.iter().map(|w| w.rows_skipped).sum();

    let wall_clock_duration_secs = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
    let aggregate_rows_per_second = if wall_clock_duration_secs > 0.0 {
        total_rows_committed as f64 / wall_clock_duration_secs
    } else {
        0.0
    };

    RunReport {
        mode,
        started_at,
        completed_at,
        workers,
        total_workers,
        completed_workers,
        failed_workers: total_workers - completed_workers,
        total_rows_committed,
        total_batches_committed,
        total_rows_skipped,
        wall_clock_duration_secs,
        aggregate_rows_per_second,
        users_in_store: None,
        addresses_in_store: None,
    }
}

/// Format the report as a table.
pub fn format_table(report: &RunReport) -> String {
    let mut output = String::new();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Worker",
        "Partition",
        "Rows",
        "Batches",
        "Skipped",
        "Duration",
        "Rows/sec",
        "Status",
    ]);

    for worker in &report.workers {
        let status_cell = if worker.success() {
            Cell::new("DONE").fg(Color::Green)
        } else {
            Cell::new("FAILED").fg(Color::Red)
        };

        table.add_row(vec![
            Cell::new(&worker.worker_id),
            Cell::new(worker.partition.to_string()),
            Cell::new(format_number(worker.rows_committed)),
            Cell::new(format_number(worker.batches_committed)),
            Cell::new(format_number(worker.rows_skipped)),
            Cell::new(format_duration(worker.duration_secs())),
            Cell::new(format!("{:.1}", worker.rows_per_second())),
            status_cell,
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL").fg(Color::Cyan),
        Cell::new(report.mode.to_string()),
        Cell::new(format_number(report.total_rows_committed)),
        Cell::new(format_number(report.total_batches_committed)),
        Cell::new(format_number(report.total_rows_skipped)),
        Cell::new(format!(
            "{}*",
            format_duration(report.wall_clock_duration_secs)
        )),
        Cell::new(format!("{:.1}†", report.aggregate_rows_per_second)),
        Cell::new(format!(
            "{}/{}",
            report.completed_workers, report.total_workers
        )),
    ]);

    output.push_str(&table.to_string());
    output.push_str("\n* Wall clock (parallel)  † Aggregate throughput\n");

    if let Some(users) = report.users_in_store {
        output.push_str(&format!(
            "\nUsers in store: {}",
            format_number(users)
        ));
        if let Some(addresses) = report.addresses_in_store {
            output.push_str(&format!(
                "  Addresses in store: {}",
                format_number(addresses)
            ));
        }
        output.push('\n');
    }

    if report.failed_workers > 0 {
        output.push_str("\nFailed Workers:\n");
        for worker in report.workers.iter().filter(|w| !w.success()) {
            match &worker.failure {
                Some(failure) => output.push_str(&format!(
                    "  {}: [{}] {}\n",
                    worker.worker_id, failure.kind, failure.message
                )),
                None => output.push_str(&format!("  {}: unknown failure\n", worker.worker_id)),
            }
        }
    }

    output
}

/// Format the report as pretty-printed JSON.
pub fn format_json(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs - (mins * 60.0);
        format!("{}m {:02.0}s", mins as u64, remaining_secs)
    } else {
        let hours = (secs / 3600.0).floor();
        let remaining = secs - (hours * 3600.0);
        let mins = (remaining / 60.0).floor();
        format!("{}h {:02}m", hours as u64, mins as u64)
    }
}

fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

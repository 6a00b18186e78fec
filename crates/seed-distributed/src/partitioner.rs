//! Static work partitioning across workers.
//!
//! Synthetic runs split the global ordinal range `[0, total)` into
//! contiguous slices. CSV runs assign data row `k` to worker `k % N`, so
//! every worker scans the file but decodes only its own rows.

use crate::config::{ConfigError, SeedMode};
use seed_core::Partition;

/// What to do with the rows left over when the total does not divide evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RemainderPolicy {
    /// The last worker also takes the remainder.
    #[default]
    #[value(name = "last")]
    AssignToLast,
    /// Refuse totals that are not a multiple of the worker count.
    Strict,
}

/// Partition of worker `index` in a synthetic run of `total` records.
pub fn synthetic_partition(
    total: u64,
    workers: usize,
    index: usize,
    policy: RemainderPolicy,
) -> Result<Partition, ConfigError> {
    check_index(workers, index)?;

    let n = workers as u64;
    let remainder = total % n;
    if remainder != 0 && policy == RemainderPolicy::Strict {
        return Err(ConfigError::UnevenPartition { total, workers });
    }

    let quota = total / n;
    let start = index as u64 * quota;
    let end = if index == workers - 1 {
        total
    } else {
        start + quota
    };

    Ok(Partition::Range { start, end })
}

/// Partition of worker `index` in a CSV run.
pub fn csv_partition(workers: usize, index: usize) -> Result<Partition, ConfigError> {
    check_index(workers, index)?;
    Ok(Partition::Modulo { workers, index })
}

/// Partitions for every worker, in worker order.
pub fn plan_partitions(
    mode: SeedMode,
    total: Option<u64>,
    workers: usize,
    policy: RemainderPolicy,
) -> Result<Vec<Partition>, ConfigError> {
    if workers == 0 {
        return Err(ConfigError::InvalidWorkerCount);
    }

    (0..workers)
        .map(|index| match mode {
            SeedMode::Synthetic => {
                let total = total.ok_or(ConfigError::MissingTotal)?;
                synthetic_partition(total, workers, index, policy)
            }
            SeedMode::Csv => csv_partition(workers, index),
        })
        .collect()
}

/// Describe the partitioning plan for logging.
pub fn describe_partitioning(partitions: &[Partition]) -> String {
    let mut lines = Vec::with_capacity(partitions.len() + 1);
    lines.push("Work distribution:".to_string());

    for (index, partition) in partitions.iter().enumerate() {
        let size = partition
            .len()
            .map(|n| format!(" ({n} records)"))
            .unwrap_or_default();
        lines.push(format!("  worker-{index}: {partition}{size}"));
    }

    lines.join("\n")
}

fn check_index(workers: usize, index: usize) -> Result<(), ConfigError> {
    if workers == 0 {
        return Err(ConfigError::InvalidWorkerCount);
    }
    if index >= workers {
        return Err(ConfigError::WorkerIndexOutOfRange { index, workers });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(partitions: &[Partition]) -> Vec<u64> {
        let mut rows = Vec::new();
        for partition in partitions {
            if let Partition::Range { start, end } = partition {
                rows.extend(*start..*end);
            }
        }
        rows
    }

    #[test]
    fn test_even_split() {
        let partitions =
            plan_partitions(SeedMode::Synthetic, Some(10), 2, RemainderPolicy::Strict).unwrap();
        assert_eq!(
            partitions,
            vec![
                Partition::Range { start: 0, end: 5 },
                Partition::Range { start: 5, end: 10 }
            ]
        );
    }

    #[test]
    fn test_remainder_goes_to_last_worker() {
        let partitions =
            plan_partitions(SeedMode::Synthetic, Some(10), 3, RemainderPolicy::AssignToLast)
                .unwrap();
        assert_eq!(partitions[0], Partition::Range { start: 0, end: 3 });
        assert_eq!(partitions[1], Partition::Range { start: 3, end: 6 });
        assert_eq!(partitions[2], Partition::Range { start: 6, end: 10 });
    }

    #[test]
    fn test_exact_coverage_for_many_shapes() {
        for total in [0u64, 1, 7, 10, 99, 1000, 1001] {
            for workers in 1..=12 {
                let partitions = plan_partitions(
                    SeedMode::Synthetic,
                    Some(total),
                    workers,
                    RemainderPolicy::AssignToLast,
                )
                .unwrap();
                assert_eq!(partitions.len(), workers);
                assert_eq!(
                    covered(&partitions),
                    (0..total).collect::<Vec<_>>(),
                    "total={total} workers={workers}"
                );
            }
        }
    }

    #[test]
    fn test_more_workers_than_records() {
        let partitions =
            plan_partitions(SeedMode::Synthetic, Some(2), 4, RemainderPolicy::AssignToLast)
                .unwrap();
        let sizes: Vec<_> = partitions.iter().map(|p| p.len().unwrap()).collect();
        assert_eq!(sizes, vec![0, 0, 0, 2]);
    }

    #[test]
    fn test_strict_rejects_uneven_total() {
        assert_eq!(
            synthetic_partition(10, 3, 0, RemainderPolicy::Strict),
            Err(ConfigError::UnevenPartition {
                total: 10,
                workers: 3
            })
        );
    }

    #[test]
    fn test_csv_rows_owned_exactly_once() {
        for workers in 1..=7 {
            let partitions =
                plan_partitions(SeedMode::Csv, None, workers, RemainderPolicy::default()).unwrap();
            for row in 0..100u64 {
                let owners = partitions.iter().filter(|p| p.owns(row)).count();
                assert_eq!(owners, 1, "row {row} with {workers} workers");
            }
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(csv_partition(0, 0), Err(ConfigError::InvalidWorkerCount));
        assert_eq!(
            csv_partition(2, 2),
            Err(ConfigError::WorkerIndexOutOfRange {
                index: 2,
                workers: 2
            })
        );
        assert_eq!(
            plan_partitions(SeedMode::Synthetic, None, 2, RemainderPolicy::default()),
            Err(ConfigError::MissingTotal)
        );
        assert_eq!(
            plan_partitions(SeedMode::Csv, None, 0, RemainderPolicy::default()),
            Err(ConfigError::InvalidWorkerCount)
        );
    }

    #[test]
    fn test_describe_partitioning() {
        let partitions =
            plan_partitions(SeedMode::Synthetic, Some(10), 2, RemainderPolicy::default()).unwrap();
        let description = describe_partitioning(&partitions);

        assert!(description.starts_with("Work distribution:"));
        assert!(description.contains("worker-0: rows [0, 5) (5 records)"));
        assert!(description.contains("worker-1: rows [5, 10) (5 records)"));
    }
}

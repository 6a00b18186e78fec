//! The share of the total work owned by a single worker.

use serde::{Deserialize, Serialize};

/// Work owned by one worker, computed once before the worker starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Partition {
    /// Dataset row `k` is owned iff `k % workers == index`.
    Modulo { workers: usize, index: usize },
    /// Contiguous half-open range `[start, end)` of synthetic ordinals.
    Range { start: u64, end: u64 },
}

impl Partition {
    /// Whether the zero-based row `row` belongs to this partition.
    pub fn owns(&self, row: u64) -> bool {
        match *self {
            Partition::Modulo { workers, index } => {
                workers > 0 && row % workers as u64 == index as u64
            }
            Partition::Range { start, end } => row >= start && row < end,
        }
    }

    /// Number of rows owned, when known without reading the dataset.
    pub fn len(&self) -> Option<u64> {
        match *self {
            Partition::Modulo { .. } => None,
            Partition::Range { start, end } => Some(end.saturating_sub(start)),
        }
    }

    /// Whether the partition is known to own no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Modulo { workers, index } => write!(f, "rows k % {workers} == {index}"),
            Partition::Range { start, end } => write!(f, "rows [{start}, {end})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modulo_owns() {
        let p = Partition::Modulo {
            workers: 3,
            index: 1,
        };
        assert!(!p.owns(0));
        assert!(p.owns(1));
        assert!(p.owns(4));
        assert!(!p.owns(5));
        assert_eq!(p.len(), None);
    }

    #[test]
    fn test_range_owns() {
        let p = Partition::Range { start: 5, end: 10 };
        assert!(!p.owns(4));
        assert!(p.owns(5));
        assert!(p.owns(9));
        assert!(!p.owns(10));
        assert_eq!(p.len(), Some(5));
        assert!(!p.is_empty());
        assert!(Partition::Range { start: 3, end: 3 }.is_empty());
    }

    #[test]
    fn test_display() {
        let p = Partition::Range { start: 0, end: 5 };
        assert_eq!(p.to_string(), "rows [0, 5)");
    }
}

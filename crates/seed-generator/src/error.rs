//! Error types for record generation.

use seed_core::Partition;
use std::path::PathBuf;
use thiserror::Error;

/// A single malformed dataset row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Row does not have the same number of columns as the header.
    #[error("Row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        row: u64,
        expected: usize,
        found: usize,
    },

    /// A mapped column is not valid UTF-8.
    #[error("Row {row}: column {column} is not valid UTF-8")]
    InvalidUtf8 { row: u64, column: usize },
}

impl ParseError {
    /// Zero-based data row the error was found on.
    pub fn row(&self) -> u64 {
        match self {
            ParseError::ColumnCount { row, .. } | ParseError::InvalidUtf8 { row, .. } => *row,
        }
    }
}

/// Errors that can occur while producing records.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The dataset could not be opened or read.
    #[error("Failed to read CSV source {path:?}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The dataset header does not match the column layout.
    #[error("CSV header has {found} columns but the layout requires at least {required}")]
    Schema { required: usize, found: usize },

    /// The partition kind does not fit the source.
    #[error("Source cannot iterate partition {0}")]
    UnsupportedPartition(Partition),

    /// One row could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl RecordError {
    /// Whether the error affects only the current row.
    pub fn is_skippable(&self) -> bool {
        matches!(self, RecordError::Parse(_))
    }
}

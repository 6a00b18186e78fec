//! Error types for seed stores.

use seed_core::Table;
use thiserror::Error;

/// Errors that can occur while talking to a store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// PostgreSQL connection or query error.
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),

    /// Connection could not be established.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction boundary misuse or failure.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A row violated a table constraint.
    #[error("Constraint violation on {table}: {message}")]
    Constraint { table: Table, message: String },

    /// Insert rejected by the store.
    #[error("Insert into {table} failed: {message}")]
    Insert { table: Table, message: String },
}

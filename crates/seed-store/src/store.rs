//! Store traits consumed by the batch writer.
//!
//! A store is the external relational database seen through the four
//! operations a batch needs (`begin_transaction`, `bulk_insert`, `commit`,
//! `rollback`). Each worker owns exactly one store obtained from a shared
//! [`StoreConnector`], so connections are never shared between workers.

use crate::error::StoreError;
use async_trait::async_trait;
use seed_core::{AddressRecord, Table, UserRecord};

/// Rows destined for one table.
#[derive(Debug, Clone, Copy)]
pub enum TableRows<'a> {
    Users(&'a [UserRecord]),
    Addresses(&'a [AddressRecord]),
}

impl TableRows<'_> {
    pub fn table(&self) -> Table {
        match self {
            TableRows::Users(_) => Table::Users,
            TableRows::Addresses(_) => Table::Addresses,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TableRows::Users(rows) => rows.len(),
            TableRows::Addresses(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One exclusive connection to the target database.
#[async_trait]
pub trait SeedStore: Send {
    /// Open a transaction. Fails if one is already open.
    async fn begin_transaction(&mut self) -> Result<(), StoreError>;

    /// Insert all rows into their table inside the open transaction.
    ///
    /// Returns the number of rows inserted.
    async fn bulk_insert(&mut self, rows: TableRows<'_>) -> Result<u64, StoreError>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Roll back the open transaction. A no-op when none is open.
    async fn rollback(&mut self) -> Result<(), StoreError>;

    /// Create the `users` and `addresses` tables if they do not exist.
    async fn ensure_schema(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Number of committed rows in `table`, when the store can tell.
    async fn count(&mut self, _table: Table) -> Result<Option<u64>, StoreError> {
        Ok(None)
    }
}

/// Factory handing each worker its own store.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    type Store: SeedStore + 'static;

    /// Open a new, unshared connection.
    async fn connect(&self) -> Result<Self::Store, StoreError>;

    /// Short backend name for logs and reports.
    fn name(&self) -> &'static str;
}

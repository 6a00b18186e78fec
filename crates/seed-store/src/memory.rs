//! In-memory store for dry runs and tests.
//!
//! [`MemoryDatabase`] is a cloneable handle to shared committed state.
//! Every [`MemoryStore`] session stages its rows privately and publishes
//! them only on commit, enforcing the same constraints the PostgreSQL
//! schema does: unique user ids and emails, and addresses that reference a
//! user committed earlier or in the same transaction.

use crate::error::StoreError;
use crate::store::{SeedStore, StoreConnector, TableRows};
use async_trait::async_trait;
use seed_core::{AddressRecord, Table, UserRecord};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Failures the database should simulate.
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    /// Reject new connections.
    pub refuse_connections: bool,
    /// Fail the addresses insert of any transaction started after this
    /// many commits, after the users insert succeeded.
    pub fail_addresses_after_commits: Option<u64>,
    /// Sleep before each bulk insert.
    pub insert_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<UserRecord>,
    addresses: Vec<AddressRecord>,
    user_ids: HashSet<Uuid>,
    emails: HashSet<String>,
    /// Row count of every committed transaction, in commit order
    committed_batches: Vec<usize>,
    /// Total calls to begin/insert/commit/rollback across sessions
    operations: u64,
    connections: u64,
    schema_ensured: bool,
}

/// Shared handle to an in-memory database.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
    failures: FailurePlan,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given failure plan for all future sessions.
    pub fn with_failures(mut self, failures: FailurePlan) -> Self {
        self.failures = failures;
        self
    }

    /// Committed users, in commit order.
    pub async fn users(&self) -> Vec<UserRecord> {
        self.state.lock().await.users.clone()
    }

    /// Committed addresses, in commit order.
    pub async fn addresses(&self) -> Vec<AddressRecord> {
        self.state.lock().await.addresses.clone()
    }

    /// Size of every committed transaction, in commit order.
    pub async fn committed_batches(&self) -> Vec<usize> {
        self.state.lock().await.committed_batches.clone()
    }

    /// Number of store operations issued so far.
    pub async fn operation_count(&self) -> u64 {
        self.state.lock().await.operations
    }

    /// Number of sessions opened so far.
    pub async fn connection_count(&self) -> u64 {
        self.state.lock().await.connections
    }

    pub async fn schema_ensured(&self) -> bool {
        self.state.lock().await.schema_ensured
    }
}

#[async_trait]
impl StoreConnector for MemoryDatabase {
    type Store = MemoryStore;

    async fn connect(&self) -> Result<MemoryStore, StoreError> {
        if self.failures.refuse_connections {
            return Err(StoreError::Connection(
                "memory database refused connection".to_string(),
            ));
        }
        self.state.lock().await.connections += 1;
        Ok(MemoryStore {
            db: self.clone(),
            pending: None,
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug, Default)]
struct Pending {
    users: Vec<UserRecord>,
    addresses: Vec<AddressRecord>,
    /// Commits that had happened when this transaction began
    commits_at_begin: u64,
}

/// One session against a [`MemoryDatabase`].
#[derive(Debug)]
pub struct MemoryStore {
    db: MemoryDatabase,
    pending: Option<Pending>,
}

impl MemoryStore {
    async fn record_operation(&self) {
        self.db.state.lock().await.operations += 1;
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    async fn begin_transaction(&mut self) -> Result<(), StoreError> {
        self.record_operation().await;
        if self.pending.is_some() {
            return Err(StoreError::Transaction(
                "transaction already open".to_string(),
            ));
        }
        let commits_at_begin = self.db.state.lock().await.committed_batches.len() as u64;
        self.pending = Some(Pending {
            commits_at_begin,
            ..Pending::default()
        });
        Ok(())
    }

    async fn bulk_insert(&mut self, rows: TableRows<'_>) -> Result<u64, StoreError> {
        self.record_operation().await;
        if let Some(delay) = self.db.failures.insert_delay {
            tokio::time::sleep(delay).await;
        }

        let fail_after = self.db.failures.fail_addresses_after_commits;
        let pending = self.pending.as_mut().ok_or_else(|| {
            StoreError::Transaction(format!(
                "bulk insert into {} outside a transaction",
                rows.table()
            ))
        })?;

        match rows {
            TableRows::Users(users) => pending.users.extend_from_slice(users),
            TableRows::Addresses(addresses) => {
                if fail_after.is_some_and(|n| pending.commits_at_begin >= n) {
                    return Err(StoreError::Insert {
                        table: Table::Addresses,
                        message: "simulated failure".to_string(),
                    });
                }
                pending.addresses.extend_from_slice(addresses);
            }
        }
        Ok(rows.len() as u64)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.record_operation().await;
        let pending = self.pending.take().ok_or_else(|| {
            StoreError::Transaction("commit without open transaction".to_string())
        })?;

        let mut state = self.db.state.lock().await;

        let mut batch_ids = HashSet::with_capacity(pending.users.len());
        let mut batch_emails = HashSet::with_capacity(pending.users.len());
        for user in &pending.users {
            if state.user_ids.contains(&user.id) || !batch_ids.insert(user.id) {
                return Err(StoreError::Constraint {
                    table: Table::Users,
                    message: format!("duplicate id {}", user.id),
                });
            }
            if state.emails.contains(&user.email) || !batch_emails.insert(user.email.as_str()) {
                return Err(StoreError::Constraint {
                    table: Table::Users,
                    message: format!("duplicate email {}", user.email),
                });
            }
        }
        for address in &pending.addresses {
            if !batch_ids.contains(&address.user_id) && !state.user_ids.contains(&address.user_id)
            {
                return Err(StoreError::Constraint {
                    table: Table::Addresses,
                    message: format!("user {} does not exist", address.user_id),
                });
            }
        }

        state.committed_batches.push(pending.users.len());
        for user in pending.users {
            state.user_ids.insert(user.id);
            state.emails.insert(user.email.clone());
            state.users.push(user);
        }
        state.addresses.extend(pending.addresses);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.record_operation().await;
        self.pending = None;
        Ok(())
    }

    async fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.db.state.lock().await.schema_ensured = true;
        Ok(())
    }

    async fn count(&mut self, table: Table) -> Result<Option<u64>, StoreError> {
        let state = self.db.state.lock().await;
        let count = match table {
            Table::Users => state.users.len(),
            Table::Addresses => state.addresses.len(),
        };
        Ok(Some(count as u64))
    }
}

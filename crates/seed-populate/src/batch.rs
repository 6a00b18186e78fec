//! Batched, transactional writes of user/address pairs.

use seed_core::{AddressRecord, SeedRecord, UserRecord};
use seed_store::{SeedStore, StoreError, TableRows};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default number of pairs per transaction.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Pairs waiting to be written, kept as two parallel row vectors so each
/// table can be bulk-inserted from a slice.
#[derive(Debug, Default)]
pub struct Batch {
    users: Vec<UserRecord>,
    addresses: Vec<AddressRecord>,
}

impl Batch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            users: Vec::with_capacity(capacity),
            addresses: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: SeedRecord) {
        let (user, address) = record.into_parts();
        self.users.push(user);
        self.addresses.push(address);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn addresses(&self) -> &[AddressRecord] {
        &self.addresses
    }

    pub fn clear(&mut self) {
        self.users.clear();
        self.addresses.clear();
    }
}

/// Counters kept by a [`BatchWriter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Pairs committed (one user and one address each).
    pub rows_committed: u64,
    /// Transactions committed.
    pub batches_committed: u64,
    /// Size of every committed batch, in commit order.
    pub batch_sizes: Vec<usize>,
    /// Time spent inside flushes.
    pub flush_duration: Duration,
}

/// Accumulates pairs and writes each full batch in one transaction.
pub struct BatchWriter<S: SeedStore> {
    store: S,
    batch: Batch,
    batch_size: usize,
    stats: WriterStats,
}

impl<S: SeedStore> BatchWriter<S> {
    /// Create a writer over an exclusive store connection.
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn new(store: S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            batch: Batch::with_capacity(batch_size),
            batch_size,
            stats: WriterStats::default(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Pairs buffered and not yet written.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    /// Buffer a pair without writing. Returns `true` once the batch is full
    /// and must be flushed before the next push.
    pub fn push(&mut self, record: SeedRecord) -> bool {
        self.batch.push(record);
        self.batch.len() >= self.batch_size
    }

    /// Buffer a pair and flush if the batch reached its size.
    ///
    /// Returns the number of pairs written by this call.
    pub async fn append(&mut self, record: SeedRecord) -> Result<usize, StoreError> {
        if self.push(record) {
            self.flush().await
        } else {
            Ok(0)
        }
    }

    /// Write the buffered pairs in one transaction: all users, then all
    /// addresses, then commit. On failure the transaction is rolled back
    /// and the buffered pairs are discarded.
    ///
    /// An empty batch issues no store operation.
    pub async fn flush(&mut self) -> Result<usize, StoreError> {
        if self.batch.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let rows = self.batch.len();

        let result = write_batch(&mut self.store, &self.batch).await;
        self.batch.clear();

        if let Err(e) = result {
            if let Err(rollback_err) = self.store.rollback().await {
                warn!("Rollback after failed batch also failed: {}", rollback_err);
            }
            warn!("Discarded batch of {} rows: {}", rows, e);
            return Err(e);
        }

        self.stats.rows_committed += rows as u64;
        self.stats.batches_committed += 1;
        self.stats.batch_sizes.push(rows);
        self.stats.flush_duration += start.elapsed();

        debug!(
            "Batch {} committed: {} rows",
            self.stats.batches_committed, rows
        );

        Ok(rows)
    }

    /// Flush whatever is left at the end of a partition.
    pub async fn finish(&mut self) -> Result<WriterStats, StoreError> {
        self.flush().await?;
        Ok(self.stats.clone())
    }
}

async fn write_batch<S: SeedStore>(store: &mut S, batch: &Batch) -> Result<(), StoreError> {
    store.begin_transaction().await?;
    store.bulk_insert(TableRows::Users(batch.users())).await?;
    store
        .bulk_insert(TableRows::Addresses(batch.addresses()))
        .await?;
    store.commit().await
}

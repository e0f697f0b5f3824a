use async_trait::async_trait;

use crate::domain::error::JournalError;

/// One queued operation of a store transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOp {
    /// Add `member` to the sorted collection at `key` with `score`
    SortedSetAdd { key: String, member: Vec<u8>, score: u64 },
    /// Set the plain value at `key`
    Set { key: String, value: Vec<u8> }
}

impl TransactionOp {
    pub fn key(&self) -> &str {
        match self {
            TransactionOp::SortedSetAdd { key, .. } | TransactionOp::Set { key, .. } => key
        }
    }
}

/// Operations queued for a single all-or-nothing commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    operations: Vec<TransactionOp>
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sorted_set_add(&mut self, key: impl Into<String>, member: Vec<u8>, score: u64) -> &mut Self {
        self.operations.push(TransactionOp::SortedSetAdd { key: key.into(), member, score });
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) -> &mut Self {
        self.operations.push(TransactionOp::Set { key: key.into(), value });
        self
    }

    pub fn operations(&self) -> &[TransactionOp] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<TransactionOp> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether any queued operation touches `key`
    pub fn touches(&self, key: &str) -> bool {
        self.operations.iter().any(|op| op.key() == key)
    }
}

/// Ordered key-value store capability used by the journal
///
/// Sorted collections and plain values live in separate keyspaces. A sorted
/// collection holds at most one member per score.
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Members of the sorted collection at `key` with `low <= score <= high`, ascending by score.
    /// Skips `offset` members and returns at most `limit`.
    async fn range_read(
        &self,
        key: &str,
        low: u64,
        high: u64,
        offset: u64,
        limit: u64
    ) -> Result<Vec<Vec<u8>>, JournalError>;

    /// Remove every member with `low <= score <= high`; a no-op when none match
    async fn range_delete(&self, key: &str, low: u64, high: u64) -> Result<(), JournalError>;

    /// Read the plain value at `key`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, JournalError>;

    /// Write the plain value at `key`
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), JournalError>;

    fn begin_transaction(&self) -> Transaction {
        Transaction::new()
    }

    /// Apply all queued operations or none.
    ///
    /// `Ok(false)` means the store refused the transaction without applying anything.
    async fn execute(&self, transaction: Transaction) -> Result<bool, JournalError>;
}

//! Test doubles shared by the unit tests

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering}
    },
    time::Duration
};

use async_trait::async_trait;

use crate::{
    adapter::store::InMemoryStreamStore,
    domain::error::JournalError,
    port::store::{StreamStore, Transaction}
};

/// How a transaction touching a faulted key behaves
#[derive(Debug, Clone)]
pub enum Fault {
    /// The store answers "not applied"
    NotApplied,
    /// The store fails with a backend error
    Backend(String),
    /// Commit only once the given value key exists
    WaitFor(String)
}

/// In-memory store that injects faults into transactions touching chosen keys
#[derive(Default)]
pub struct FaultyStore {
    inner:  InMemoryStreamStore,
    faults: Mutex<HashMap<String, Fault>>,
    calls:  AtomicUsize
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_transactions_on(&self, key: impl Into<String>, fault: Fault) {
        self.faults.lock().unwrap().insert(key.into(), fault);
    }

    /// Number of store calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fault_for(&self, transaction: &Transaction) -> Option<Fault> {
        let faults = self.faults.lock().unwrap();
        transaction.operations().iter().find_map(|op| faults.get(op.key()).cloned())
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StreamStore for FaultyStore {
    async fn range_read(
        &self,
        key: &str,
        low: u64,
        high: u64,
        offset: u64,
        limit: u64
    ) -> Result<Vec<Vec<u8>>, JournalError> {
        self.record_call();
        self.inner.range_read(key, low, high, offset, limit).await
    }

    async fn range_delete(&self, key: &str, low: u64, high: u64) -> Result<(), JournalError> {
        self.record_call();
        self.inner.range_delete(key, low, high).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, JournalError> {
        self.record_call();
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), JournalError> {
        self.record_call();
        self.inner.set(key, value).await
    }

    async fn execute(&self, transaction: Transaction) -> Result<bool, JournalError> {
        self.record_call();

        match self.fault_for(&transaction) {
            None => self.inner.execute(transaction).await,
            Some(Fault::NotApplied) => Ok(false),
            Some(Fault::Backend(message)) => Err(JournalError::Store(message)),
            Some(Fault::WaitFor(key)) => {
                while self.inner.get(&key).await?.is_none() {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                self.inner.execute(transaction).await
            }
        }
    }
}

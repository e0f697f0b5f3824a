//! Stream store implementations
//!
//! This module provides both in-memory and persistent (RocksDB) implementations
//! of the StreamStore trait.

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
    sync::Arc
};

use async_trait::async_trait;
use rocksdb::{ColumnFamily, DB, Direction, IteratorMode, Options, WriteBatch};
use tokio::sync::RwLock;
use tracing::{Level, event};

use crate::{
    config::JournalSettings,
    domain::{constant::stream_store, error::JournalError},
    port::store::{StreamStore, Transaction, TransactionOp}
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StoreType {
    #[serde(rename = "inmemory")]
    InMemory,
    #[serde(rename = "rocksdb")]
    RocksDb
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::InMemory => "inmemory",
            StoreType::RocksDb => "rocksdb"
        }
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[derive(Debug, Default)]
struct InMemoryState {
    /// Sorted collections: key -> score -> member
    collections: HashMap<String, BTreeMap<u64, Vec<u8>>>,
    /// Plain values
    values:      HashMap<String, Vec<u8>>
}

/// In-memory stream store implementation
///
/// Suitable for development and testing; data is lost when the process exits.
/// Transactions are applied under a single write lock, so readers never see a
/// partially applied transaction.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStreamStore {
    state: Arc<RwLock<InMemoryState>>
}

impl InMemoryStreamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StreamStore for InMemoryStreamStore {
    async fn range_read(
        &self,
        key: &str,
        low: u64,
        high: u64,
        offset: u64,
        limit: u64
    ) -> Result<Vec<Vec<u8>>, JournalError> {
        if low > high || limit == 0 {
            return Ok(vec![]);
        }

        let state = self.state.read().await;
        let members = match state.collections.get(key) {
            Some(collection) => collection
                .range(low..=high)
                .skip(to_usize(offset))
                .take(to_usize(limit))
                .map(|(_, member)| member.clone())
                .collect(),
            None => vec![]
        };

        Ok(members)
    }

    async fn range_delete(&self, key: &str, low: u64, high: u64) -> Result<(), JournalError> {
        if low > high {
            return Ok(());
        }

        let mut state = self.state.write().await;
        if let Some(collection) = state.collections.get_mut(key) {
            let doomed: Vec<u64> = collection.range(low..=high).map(|(score, _)| *score).collect();
            for score in doomed {
                collection.remove(&score);
            }
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, JournalError> {
        let state = self.state.read().await;
        Ok(state.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), JournalError> {
        let mut state = self.state.write().await;
        state.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn execute(&self, transaction: Transaction) -> Result<bool, JournalError> {
        let mut state = self.state.write().await;

        for op in transaction.into_operations() {
            match op {
                TransactionOp::SortedSetAdd { key, member, score } => {
                    state.collections.entry(key).or_default().insert(score, member);
                }
                TransactionOp::Set { key, value } => {
                    state.values.insert(key, value);
                }
            }
        }

        Ok(true)
    }
}

const CF_STREAMS: &str = "streams";
const CF_VALUES: &str = "values";

/// Column family holding `family` for the logical database `database`
fn cf_name(database: u32, family: &str) -> String {
    format!("db{}.{}", database, family)
}

/// `len(key) ‖ key` - every member of the collection starts with this
fn collection_prefix(key: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(4 + key.len() + 8);
    prefix.extend_from_slice(&(key.len() as u32).to_be_bytes());
    prefix.extend_from_slice(key.as_bytes());
    prefix
}

/// `len(key) ‖ key ‖ score`, big-endian so byte order equals score order
fn member_key(key: &str, score: u64) -> Vec<u8> {
    let mut member = collection_prefix(key);
    member.extend_from_slice(&score.to_be_bytes());
    member
}

fn score_of(member: &[u8], prefix_len: usize) -> Result<u64, JournalError> {
    let bytes: [u8; 8] = member[prefix_len..]
        .try_into()
        .map_err(|_| JournalError::Store(format!("malformed sorted collection key of {} bytes", member.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

fn column_family<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily, JournalError> {
    db.cf_handle(name).ok_or_else(|| JournalError::Store(format!("Column family '{}' not found", name)))
}

/// RocksDB-based stream store implementation
///
/// Storage layout, per logical database N:
/// - `db{N}.streams`: `len(key) ‖ key ‖ score` -> member
/// - `db{N}.values`: `key` -> value
///
/// A transaction is written as one `WriteBatch`, which RocksDB applies atomically.
pub struct RocksDbStreamStore {
    db:         Arc<DB>,
    streams_cf: String,
    values_cf:  String
}

impl RocksDbStreamStore {
    /// Open (or create) the store at `path`, using the keyspace of logical database `database`
    pub fn open(path: &Path, database: u32) -> Result<Self, JournalError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let streams_cf = cf_name(database, CF_STREAMS);
        let values_cf = cf_name(database, CF_VALUES);

        // Every existing column family has to be named when opening
        let mut cf_names = DB::list_cf(&opts, path).unwrap_or_default();
        for name in [&streams_cf, &values_cf] {
            if !cf_names.contains(name) {
                cf_names.push(name.clone());
            }
        }

        let db = DB::open_cf(&opts, path, &cf_names)
            .map_err(|e| JournalError::Configuration(format!("Failed to open RocksDB at {}: {}", path.display(), e)))?;

        Ok(Self { db: Arc::new(db), streams_cf, values_cf })
    }

    /// Run a blocking RocksDB call off the async runtime
    async fn blocking<T, F>(&self, f: F) -> Result<T, JournalError>
    where
        T: Send + 'static,
        F: FnOnce(&DB) -> Result<T, JournalError> + Send + 'static
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }
}

#[async_trait]
impl StreamStore for RocksDbStreamStore {
    async fn range_read(
        &self,
        key: &str,
        low: u64,
        high: u64,
        offset: u64,
        limit: u64
    ) -> Result<Vec<Vec<u8>>, JournalError> {
        if low > high || limit == 0 {
            return Ok(vec![]);
        }

        let cf_streams = self.streams_cf.clone();
        let key = key.to_string();

        self.blocking(move |db| {
            let cf = column_family(db, &cf_streams)?;
            let prefix = collection_prefix(&key);
            let start = member_key(&key, low);

            let mut members = Vec::new();
            let mut skipped = 0u64;

            for item in db.iterator_cf(cf, IteratorMode::From(start.as_slice(), Direction::Forward)) {
                let (stored_key, member) = item?;
                if !stored_key.starts_with(&prefix) || score_of(&stored_key, prefix.len())? > high {
                    break;
                }
                if skipped < offset {
                    skipped += 1;
                    continue;
                }
                members.push(member.into_vec());
                if members.len() as u64 >= limit {
                    break;
                }
            }

            Ok(members)
        })
        .await
    }

    async fn range_delete(&self, key: &str, low: u64, high: u64) -> Result<(), JournalError> {
        if low > high {
            return Ok(());
        }

        let cf_streams = self.streams_cf.clone();
        let key = key.to_string();

        self.blocking(move |db| {
            let cf = column_family(db, &cf_streams)?;
            let prefix = collection_prefix(&key);
            let start = member_key(&key, low);

            let mut batch = WriteBatch::default();
            for item in db.iterator_cf(cf, IteratorMode::From(start.as_slice(), Direction::Forward)) {
                let (stored_key, _) = item?;
                if !stored_key.starts_with(&prefix) || score_of(&stored_key, prefix.len())? > high {
                    break;
                }
                batch.delete_cf(cf, &stored_key);
            }

            if !batch.is_empty() {
                db.write(batch)?;
            }
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, JournalError> {
        let cf_values = self.values_cf.clone();
        let key = key.to_string();

        self.blocking(move |db| {
            let cf = column_family(db, &cf_values)?;
            Ok(db.get_cf(cf, key.as_bytes())?)
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), JournalError> {
        let cf_values = self.values_cf.clone();
        let key = key.to_string();

        self.blocking(move |db| {
            let cf = column_family(db, &cf_values)?;
            Ok(db.put_cf(cf, key.as_bytes(), value)?)
        })
        .await
    }

    async fn execute(&self, transaction: Transaction) -> Result<bool, JournalError> {
        let cf_streams = self.streams_cf.clone();
        let cf_values = self.values_cf.clone();
        let operations = transaction.len();

        let result = self
            .blocking(move |db| {
                let streams = column_family(db, &cf_streams)?;
                let values = column_family(db, &cf_values)?;

                let mut batch = WriteBatch::default();
                for op in transaction.into_operations() {
                    match op {
                        TransactionOp::SortedSetAdd { key, member, score } => {
                            batch.put_cf(streams, member_key(&key, score), member);
                        }
                        TransactionOp::Set { key, value } => {
                            batch.put_cf(values, key.as_bytes(), value);
                        }
                    }
                }

                db.write(batch)?;
                Ok(true)
            })
            .await;

        match &result {
            Ok(_) => event!(Level::TRACE, event = stream_store::TRANSACTION_EXECUTED, operations = operations),
            Err(e) => {
                event!(Level::ERROR, event = stream_store::TRANSACTION_FAILED, operations = operations, error = %e)
            }
        }

        result
    }
}

/// Factory for creating stream stores based on configuration
pub struct StreamStoreFactory;

impl StreamStoreFactory {
    /// Opens the configured store. Call once at startup and share the handle.
    pub fn connect(settings: &JournalSettings) -> Result<Arc<dyn StreamStore>, JournalError> {
        let store: Arc<dyn StreamStore> = match settings.store {
            StoreType::InMemory => Arc::new(InMemoryStreamStore::new()),
            StoreType::RocksDb => {
                let path = settings.store_path()?;
                match RocksDbStreamStore::open(&path, settings.database) {
                    Ok(store) => Arc::new(store),
                    Err(e) => {
                        event!(Level::ERROR, event = stream_store::STORE_OPEN_FAILED,
                               store = settings.store.as_str(), path = %path.display(), error = %e);
                        return Err(e);
                    }
                }
            }
        };

        event!(Level::INFO, event = stream_store::STORE_OPENED,
               store = settings.store.as_str(), database = settings.database);

        Ok(store)
    }
}

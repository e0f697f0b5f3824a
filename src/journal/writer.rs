//! Batch writer
//!
//! A batch is split by persistence id. Every persistence id gets exactly one
//! store transaction holding all of its records plus its cursor update, and
//! those transactions run concurrently. A failed transaction only fails the
//! writes of its own persistence id.

use std::{collections::HashMap, sync::Arc};

use futures::future::join_all;
use tracing::{Level, event};

use crate::{
    domain::{
        constant::journal,
        error::JournalError,
        keys::KeyLayout,
        record::{AtomicWrite, PersistentRepr}
    },
    journal::{codec::RecordCodec, cursor::encode_cursor},
    port::store::StreamStore
};

/// Where the outcome of one input write comes from
enum Planned {
    Rejected(JournalError),
    Group(usize)
}

fn validate(write: &AtomicWrite) -> Result<(), JournalError> {
    if write.is_empty() {
        return Err(JournalError::InvalidRequest(format!(
            "atomic write for '{}' contains no records",
            write.persistence_id
        )));
    }

    if let Some(stray) = write.payload.iter().find(|r| r.persistence_id != write.persistence_id) {
        return Err(JournalError::InvalidRequest(format!(
            "record {} of '{}' was submitted in an atomic write for '{}'",
            stray.sequence_nr, stray.persistence_id, write.persistence_id
        )));
    }

    Ok(())
}

#[derive(Clone)]
pub struct BatchWriter {
    keys:  KeyLayout,
    codec: RecordCodec,
    store: Arc<dyn StreamStore>
}

impl BatchWriter {
    pub fn new(keys: KeyLayout, codec: RecordCodec, store: Arc<dyn StreamStore>) -> Self {
        Self { keys, codec, store }
    }

    /// Write a batch, returning one outcome per atomic write in input order
    pub async fn write(&self, messages: Vec<AtomicWrite>) -> Vec<Result<(), JournalError>> {
        if messages.is_empty() {
            return vec![];
        }

        event!(Level::DEBUG, event = journal::BATCH_RECEIVED, writes = messages.len());

        let mut groups: Vec<(String, Vec<PersistentRepr>)> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut plan = Vec::with_capacity(messages.len());

        for message in messages {
            if let Err(e) = validate(&message) {
                event!(Level::WARN, event = journal::REQUEST_REJECTED,
                       persistence_id = %message.persistence_id, error = %e);
                plan.push(Planned::Rejected(e));
                continue;
            }

            let index = *group_index.entry(message.persistence_id.clone()).or_insert_with(|| {
                groups.push((message.persistence_id.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[index].1.extend(message.payload);
            plan.push(Planned::Group(index));
        }

        let results =
            join_all(groups.into_iter().map(|(persistence_id, records)| self.write_stream(persistence_id, records)))
                .await;

        let outcomes: Vec<Result<(), JournalError>> = plan
            .into_iter()
            .map(|planned| match planned {
                Planned::Rejected(e) => Err(e),
                Planned::Group(index) => results[index].clone()
            })
            .collect();

        event!(Level::DEBUG, event = journal::BATCH_COMPLETED,
               writes = outcomes.len(),
               failed = outcomes.iter().filter(|o| o.is_err()).count());

        outcomes
    }

    async fn write_stream(&self, persistence_id: String, records: Vec<PersistentRepr>) -> Result<(), JournalError> {
        let Some(highest_sequence_nr) = records.iter().map(|r| r.sequence_nr).max() else {
            return Err(JournalError::InvalidRequest(format!("no records to write for '{}'", persistence_id)));
        };

        match self.commit_stream(&persistence_id, &records, highest_sequence_nr).await {
            Ok(()) => {
                event!(Level::DEBUG, event = journal::STREAM_WRITTEN,
                       persistence_id = %persistence_id, records = records.len(),
                       highest_sequence_nr = highest_sequence_nr);
                Ok(())
            }
            Err(cause) => {
                event!(Level::WARN, event = journal::STREAM_WRITE_FAILED,
                       persistence_id = %persistence_id, records = records.len(), error = %cause);
                Err(JournalError::batch_write_failed(persistence_id, cause))
            }
        }
    }

    /// One transaction: every record appended at its sequence number, then the cursor
    async fn commit_stream(
        &self,
        persistence_id: &str,
        records: &[PersistentRepr],
        highest_sequence_nr: u64
    ) -> Result<(), JournalError> {
        let stream_key = self.keys.stream_key(persistence_id);

        let mut transaction = self.store.begin_transaction();
        for record in records {
            transaction.sorted_set_add(&stream_key, self.codec.encode(record)?, record.sequence_nr);
        }
        transaction.set(self.keys.cursor_key(persistence_id), encode_cursor(highest_sequence_nr));

        if self.store.execute(transaction).await? {
            Ok(())
        } else {
            Err(JournalError::TransactionNotApplied { key: stream_key })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        adapter::serializer::JsonSerializer,
        testing::{Fault, FaultyStore}
    };

    fn writer(store: Arc<FaultyStore>) -> BatchWriter {
        BatchWriter::new(KeyLayout::new("j"), RecordCodec::new(Arc::new(JsonSerializer::new())), store)
    }

    fn write(persistence_id: &str, sequence_nrs: &[u64]) -> AtomicWrite {
        AtomicWrite::new(
            persistence_id,
            sequence_nrs
                .iter()
                .map(|n| PersistentRepr::new(persistence_id, *n, format!("e{}", n).into_bytes()))
                .collect()
        )
    }

    async fn stored_sequence_nrs(store: &FaultyStore, persistence_id: &str) -> Vec<u64> {
        let codec = RecordCodec::new(Arc::new(JsonSerializer::new()));
        store
            .range_read(&format!("j:{}", persistence_id), 0, u64::MAX, 0, u64::MAX)
            .await
            .unwrap()
            .iter()
            .map(|bytes| codec.decode(bytes).unwrap().sequence_nr)
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch_touches_nothing() {
        let store = Arc::new(FaultyStore::new());
        let outcomes = writer(store.clone()).write(vec![]).await;

        assert!(outcomes.is_empty());
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_writes_are_grouped_per_persistence_id() {
        let store = Arc::new(FaultyStore::new());
        let outcomes = writer(store.clone())
            .write(vec![write("a", &[1, 2]), write("b", &[1]), write("a", &[3]), write("b", &[2, 3, 4])])
            .await;

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.is_ok()));
        // One transaction per persistence id
        assert_eq!(store.calls(), 2);

        assert_eq!(stored_sequence_nrs(&store, "a").await, vec![1, 2, 3]);
        assert_eq!(stored_sequence_nrs(&store, "b").await, vec![1, 2, 3, 4]);
        assert_eq!(store.get("j:a.highestSequenceNr").await.unwrap(), Some(b"3".to_vec()));
        assert_eq!(store.get("j:b.highestSequenceNr").await.unwrap(), Some(b"4".to_vec()));
    }

    #[tokio::test]
    async fn test_cursor_is_highest_of_the_batch() {
        let store = Arc::new(FaultyStore::new());
        writer(store.clone()).write(vec![write("x", &[3, 7, 5])]).await;

        assert_eq!(store.get("j:x.highestSequenceNr").await.unwrap(), Some(b"7".to_vec()));
        assert_eq!(stored_sequence_nrs(&store, "x").await, vec![3, 5, 7]);
    }

    #[tokio::test]
    async fn test_failed_persistence_id_does_not_affect_others() {
        let store = Arc::new(FaultyStore::new());
        store.fail_transactions_on("j:b", Fault::NotApplied);

        let outcomes = writer(store.clone())
            .write(vec![write("a", &[1]), write("b", &[1]), write("a", &[2]), write("b", &[2])])
            .await;

        assert!(outcomes[0].is_ok());
        assert!(outcomes[2].is_ok());
        assert_eq!(outcomes[1], outcomes[3]);
        match &outcomes[1] {
            Err(JournalError::BatchWriteFailed { persistence_id, cause }) => {
                assert_eq!(persistence_id, "b");
                assert_eq!(**cause, JournalError::TransactionNotApplied { key: "j:b".to_string() });
            }
            other => panic!("Expected BatchWriteFailed, got {:?}", other)
        }

        assert_eq!(stored_sequence_nrs(&store, "a").await, vec![1, 2]);
        assert!(stored_sequence_nrs(&store, "b").await.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_nothing_behind() {
        let store = Arc::new(FaultyStore::new());
        store.fail_transactions_on("j:z.highestSequenceNr", Fault::Backend("connection reset".to_string()));

        let outcomes = writer(store.clone()).write(vec![write("z", &[1, 2, 3])]).await;

        let err = outcomes[0].clone().unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err, JournalError::batch_write_failed("z", JournalError::Store("connection reset".to_string())));

        assert!(stored_sequence_nrs(&store, "z").await.is_empty());
        assert_eq!(store.get("j:z.highestSequenceNr").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_writes_are_rejected_individually() {
        let store = Arc::new(FaultyStore::new());
        let stray = AtomicWrite::new("a", vec![PersistentRepr::new("b", 9, vec![])]);

        let outcomes = writer(store.clone()).write(vec![write("a", &[]), write("a", &[1]), stray]).await;

        assert!(matches!(outcomes[0], Err(JournalError::InvalidRequest(_))));
        assert!(outcomes[1].is_ok());
        assert!(matches!(outcomes[2], Err(JournalError::InvalidRequest(_))));
        assert_eq!(stored_sequence_nrs(&store, "a").await, vec![1]);
        assert!(stored_sequence_nrs(&store, "b").await.is_empty());
    }

    #[tokio::test]
    async fn test_persistence_ids_commit_concurrently() {
        let store = Arc::new(FaultyStore::new());
        // "a" can only commit after "b" has, although it comes first in the batch
        store.fail_transactions_on("j:a", Fault::WaitFor("j:b.highestSequenceNr".to_string()));

        let outcomes = tokio::time::timeout(
            Duration::from_secs(5),
            writer(store.clone()).write(vec![write("a", &[1]), write("b", &[1])])
        )
        .await
        .expect("writes for different persistence ids must not wait on each other");

        assert!(outcomes.iter().all(|o| o.is_ok()));
    }
}

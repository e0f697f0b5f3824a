use std::sync::Arc;

use tracing::{Level, event};

use crate::{
    domain::{constant::journal, error::JournalError, keys::KeyLayout, record::PersistentRepr},
    journal::codec::RecordCodec,
    port::store::StreamStore
};

/// Reads a bounded slice of one stream back in sequence order
#[derive(Clone)]
pub struct ReplayReader {
    keys:  KeyLayout,
    codec: RecordCodec,
    store: Arc<dyn StreamStore>
}

impl ReplayReader {
    pub fn new(keys: KeyLayout, codec: RecordCodec, store: Arc<dyn StreamStore>) -> Self {
        Self { keys, codec, store }
    }

    /// Hands every record in `from_sequence_nr..=to_sequence_nr` to `on_record`, at most `max` of them.
    ///
    /// All entries are decoded before the first callback, so a corrupted entry fails the replay
    /// without delivering a partial history. Returns the number of records delivered.
    pub async fn replay(
        &self,
        persistence_id: &str,
        from_sequence_nr: u64,
        to_sequence_nr: u64,
        max: u64,
        on_record: &mut (dyn FnMut(PersistentRepr) + Send)
    ) -> Result<usize, JournalError> {
        if max == 0 || from_sequence_nr > to_sequence_nr {
            return Ok(0);
        }

        event!(Level::DEBUG, event = journal::REPLAY_STARTED,
               persistence_id = %persistence_id, from = from_sequence_nr, to = to_sequence_nr, max = max);

        let entries = self
            .store
            .range_read(&self.keys.stream_key(persistence_id), from_sequence_nr, to_sequence_nr, 0, max)
            .await?;

        let records = match entries.iter().map(|bytes| self.codec.decode(bytes)).collect::<Result<Vec<_>, _>>() {
            Ok(records) => records,
            Err(e) => {
                event!(Level::ERROR, event = journal::REPLAY_FAILED,
                       persistence_id = %persistence_id, error = %e);
                return Err(e);
            }
        };

        let delivered = records.len();
        for record in records {
            on_record(record);
        }

        event!(Level::DEBUG, event = journal::REPLAY_COMPLETED,
               persistence_id = %persistence_id, records = delivered);

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::{serializer::JsonSerializer, store::InMemoryStreamStore},
        port::store::StreamStore
    };

    async fn seeded(sequence_nrs: impl IntoIterator<Item = u64>) -> (ReplayReader, Arc<InMemoryStreamStore>) {
        let store = Arc::new(InMemoryStreamStore::new());
        let codec = RecordCodec::new(Arc::new(JsonSerializer::new()));

        let mut txn = store.begin_transaction();
        for n in sequence_nrs {
            txn.sorted_set_add("j:y", codec.encode(&PersistentRepr::new("y", n, vec![n as u8])).unwrap(), n);
        }
        store.execute(txn).await.unwrap();

        (ReplayReader::new(KeyLayout::new("j"), codec, store.clone()), store)
    }

    async fn collect(reader: &ReplayReader, from: u64, to: u64, max: u64) -> Result<Vec<u64>, JournalError> {
        let mut seen = Vec::new();
        reader.replay("y", from, to, max, &mut |r: PersistentRepr| seen.push(r.sequence_nr)).await?;
        Ok(seen)
    }

    #[tokio::test]
    async fn test_bounded_replay() {
        let (reader, _) = seeded(1..=10).await;

        assert_eq!(collect(&reader, 4, 8, 100).await.unwrap(), vec![4, 5, 6, 7, 8]);
        assert_eq!(collect(&reader, 1, u64::MAX, 3).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(collect(&reader, 1, u64::MAX, u64::MAX).await.unwrap(), (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_empty_ranges_deliver_nothing() {
        let (reader, _) = seeded(1..=10).await;

        assert!(collect(&reader, 8, 4, 100).await.unwrap().is_empty());
        assert!(collect(&reader, 1, 10, 0).await.unwrap().is_empty());
        assert!(collect(&reader, 11, 20, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_entry_fails_whole_replay() {
        let (reader, store) = seeded([1, 2, 4]).await;
        let mut txn = store.begin_transaction();
        txn.sorted_set_add("j:y", b"\x00garbage".to_vec(), 3);
        store.execute(txn).await.unwrap();

        let mut delivered = 0;
        let result = reader.replay("y", 1, 10, 100, &mut |_: PersistentRepr| delivered += 1).await;

        assert!(matches!(result, Err(JournalError::Decoding(_))));
        assert_eq!(delivered, 0);
    }
}

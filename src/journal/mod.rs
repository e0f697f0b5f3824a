//! Journal engine over an ordered key-value store
//!
//! Persisted layout (see `KeyLayout`):
//! - `{prefix}:{persistence_id}` -> sorted collection of encoded records, score = sequence number
//! - `{prefix}:{persistence_id}.highestSequenceNr` -> highest sequence number written
//!
//! The engine keeps no state of its own besides the shared store handle and the serializer.

pub mod codec;
pub mod cursor;
pub mod reader;
pub mod retention;
pub mod writer;

use std::sync::Arc;

use async_trait::async_trait;

pub use codec::RecordCodec;
pub use cursor::CursorTracker;
pub use reader::ReplayReader;
pub use retention::Retention;
pub use writer::BatchWriter;

use crate::{
    adapter::store::StreamStoreFactory,
    config::JournalSettings,
    domain::{
        error::JournalError,
        keys::KeyLayout,
        record::{AtomicWrite, PersistentRepr}
    },
    port::{journal::Journal, serializer::Serializer, store::StreamStore}
};

/// Journal backed by a `StreamStore`
#[derive(Clone)]
pub struct KvJournal {
    writer:    BatchWriter,
    reader:    ReplayReader,
    cursor:    CursorTracker,
    retention: Retention
}

impl KvJournal {
    pub fn new(key_prefix: impl Into<String>, store: Arc<dyn StreamStore>, serializer: Arc<dyn Serializer>) -> Self {
        let keys = KeyLayout::new(key_prefix);
        let codec = RecordCodec::new(serializer);

        Self {
            writer:    BatchWriter::new(keys.clone(), codec.clone(), store.clone()),
            reader:    ReplayReader::new(keys.clone(), codec, store.clone()),
            cursor:    CursorTracker::new(keys.clone(), store.clone()),
            retention: Retention::new(keys, store)
        }
    }

    /// Open the configured store once and build a journal on top of it
    pub fn connect(settings: &JournalSettings, serializer: Arc<dyn Serializer>) -> Result<Self, JournalError> {
        settings.validate()?;
        let store = StreamStoreFactory::connect(settings)?;
        Ok(Self::new(settings.key_prefix.clone(), store, serializer))
    }
}

#[async_trait]
impl Journal for KvJournal {
    async fn write_messages(&self, messages: Vec<AtomicWrite>) -> Vec<Result<(), JournalError>> {
        self.writer.write(messages).await
    }

    async fn replay_messages(
        &self,
        persistence_id: &str,
        from_sequence_nr: u64,
        to_sequence_nr: u64,
        max: u64,
        recovery_callback: &mut (dyn FnMut(PersistentRepr) + Send)
    ) -> Result<(), JournalError> {
        self.reader.replay(persistence_id, from_sequence_nr, to_sequence_nr, max, recovery_callback).await?;
        Ok(())
    }

    async fn read_highest_sequence_nr(&self, persistence_id: &str) -> Result<u64, JournalError> {
        self.cursor.highest_sequence_nr(persistence_id).await
    }

    async fn delete_messages_to(&self, persistence_id: &str, to_sequence_nr: u64) -> Result<(), JournalError> {
        self.retention.delete_up_to(persistence_id, to_sequence_nr).await
    }
}

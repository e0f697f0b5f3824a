use std::sync::Arc;

use crate::{
    domain::{
        error::JournalError,
        record::{JournalEntry, PersistentRepr}
    },
    port::serializer::Serializer
};

/// Turns records into stored bytes and back, delegating the encoding to a `Serializer`
#[derive(Clone)]
pub struct RecordCodec {
    serializer: Arc<dyn Serializer>
}

impl RecordCodec {
    pub fn new(serializer: Arc<dyn Serializer>) -> Self {
        Self { serializer }
    }

    pub fn encode(&self, record: &PersistentRepr) -> Result<Vec<u8>, JournalError> {
        self.serializer.to_binary(&JournalEntry::from(record))
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<PersistentRepr, JournalError> {
        self.serializer.from_binary(bytes).map(PersistentRepr::from)
    }
}

use std::sync::Arc;

use tracing::{Level, event};

use crate::{
    domain::{constant::journal, error::JournalError, keys::KeyLayout},
    port::store::StreamStore
};

/// Cursor values are stored as decimal text
pub(crate) fn encode_cursor(sequence_nr: u64) -> Vec<u8> {
    sequence_nr.to_string().into_bytes()
}

pub(crate) fn decode_cursor(bytes: &[u8]) -> Result<u64, JournalError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.trim().parse::<u64>().ok())
        .ok_or_else(|| JournalError::Decoding(format!("invalid highest sequence number: {:?}", bytes)))
}

/// Reads the stored highest sequence number of a stream
#[derive(Clone)]
pub struct CursorTracker {
    keys:  KeyLayout,
    store: Arc<dyn StreamStore>
}

impl CursorTracker {
    pub fn new(keys: KeyLayout, store: Arc<dyn StreamStore>) -> Self {
        Self { keys, store }
    }

    /// Single key lookup, independent of stream length. 0 when nothing was written yet.
    pub async fn highest_sequence_nr(&self, persistence_id: &str) -> Result<u64, JournalError> {
        let highest = match self.store.get(&self.keys.cursor_key(persistence_id)).await? {
            Some(bytes) => decode_cursor(&bytes)?,
            None => 0
        };

        event!(Level::DEBUG, event = journal::HIGHEST_SEQUENCE_READ,
               persistence_id = %persistence_id, highest_sequence_nr = highest);

        Ok(highest)
    }
}

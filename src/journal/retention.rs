use std::sync::Arc;

use tracing::{Level, event};

use crate::{
    domain::{constant::journal, error::JournalError, keys::KeyLayout},
    port::store::StreamStore
};

/// Truncates streams from the front. The cursor is left alone so numbering continues.
#[derive(Clone)]
pub struct Retention {
    keys:  KeyLayout,
    store: Arc<dyn StreamStore>
}

impl Retention {
    pub fn new(keys: KeyLayout, store: Arc<dyn StreamStore>) -> Self {
        Self { keys, store }
    }

    pub async fn delete_up_to(&self, persistence_id: &str, to_sequence_nr: u64) -> Result<(), JournalError> {
        self.store.range_delete(&self.keys.stream_key(persistence_id), 0, to_sequence_nr).await?;

        event!(Level::DEBUG, event = journal::MESSAGES_DELETED,
               persistence_id = %persistence_id, to_sequence_nr = to_sequence_nr);

        Ok(())
    }
}

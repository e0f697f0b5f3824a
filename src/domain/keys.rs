//! Store key layout
//!
//! - `{prefix}:{persistence_id}` -> sorted collection, score = sequence number
//! - `{prefix}:{persistence_id}.highestSequenceNr` -> highest sequence number written

const CURSOR_SUFFIX: &str = ".highestSequenceNr";

/// Maps persistence ids to the keys of their stream and cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    prefix: String
}

impl KeyLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn stream_key(&self, persistence_id: &str) -> String {
        format!("{}:{}", self.prefix, persistence_id)
    }

    pub fn cursor_key(&self, persistence_id: &str) -> String {
        format!("{}{}", self.stream_key(persistence_id), CURSOR_SUFFIX)
    }
}

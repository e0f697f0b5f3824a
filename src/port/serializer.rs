use crate::domain::{error::JournalError, record::JournalEntry};

/// Byte-level encoding of journal entries, supplied by the host system
pub trait Serializer: Send + Sync {
    /// Tag identifying the encoding, stable across releases
    fn identifier(&self) -> &str;

    fn to_binary(&self, entry: &JournalEntry) -> Result<Vec<u8>, JournalError>;

    fn from_binary(&self, bytes: &[u8]) -> Result<JournalEntry, JournalError>;
}

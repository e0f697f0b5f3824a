use thiserror::Error;

/// Error types for the journal engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    /// A record could not be turned into stored bytes
    #[error("failed to encode journal entry: {0}")]
    Encoding(String),

    /// Stored bytes could not be turned back into a record
    #[error("failed to decode journal entry: {0}")]
    Decoding(String),

    /// Transport or backend failure reported by the store
    #[error("store error: {0}")]
    Store(String),

    /// The store executed the transaction but did not apply it
    #[error("transaction on '{key}' was not applied")]
    TransactionNotApplied { key: String },

    /// The transaction for one persistence id did not commit
    #[error("batch write failed for '{persistence_id}': {cause}")]
    BatchWriteFailed { persistence_id: String, cause: Box<JournalError> },

    /// Malformed input
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Settings could not be loaded or the store could not be opened
    #[error("{0}")]
    Configuration(String),

    /// Journal actor could not be reached or did not answer
    #[error("{0}")]
    Actor(String)
}

impl JournalError {
    pub fn batch_write_failed(persistence_id: impl Into<String>, cause: JournalError) -> Self {
        JournalError::BatchWriteFailed { persistence_id: persistence_id.into(), cause: Box::new(cause) }
    }

    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            JournalError::Store(_) | JournalError::TransactionNotApplied { .. } | JournalError::Actor(_) => true,
            JournalError::BatchWriteFailed { cause, .. } => cause.is_transient(),
            JournalError::Encoding(_)
            | JournalError::Decoding(_)
            | JournalError::InvalidRequest(_)
            | JournalError::Configuration(_) => false
        }
    }
}

/// Convert from rocksdb::Error
impl From<rocksdb::Error> for JournalError {
    fn from(err: rocksdb::Error) -> Self {
        JournalError::Store(err.to_string())
    }
}

/// Convert from tokio::task::JoinError (blocking store calls)
impl From<tokio::task::JoinError> for JournalError {
    fn from(err: tokio::task::JoinError) -> Self {
        JournalError::Store(format!("store task failed: {}", err))
    }
}

/// Convert from anyhow::Error
impl From<anyhow::Error> for JournalError {
    fn from(err: anyhow::Error) -> Self {
        JournalError::Configuration(format!("{:#}", err))
    }
}

/// Convert from ractor::SpawnErr
impl From<ractor::SpawnErr> for JournalError {
    fn from(err: ractor::SpawnErr) -> Self {
        JournalError::Actor(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_write_failed_keeps_cause() {
        let err = JournalError::batch_write_failed("order-1", JournalError::Store("connection reset".to_string()));

        assert_eq!(err.to_string(), "batch write failed for 'order-1': store error: connection reset");
        match &err {
            JournalError::BatchWriteFailed { persistence_id, cause } => {
                assert_eq!(persistence_id, "order-1");
                assert_eq!(**cause, JournalError::Store("connection reset".to_string()));
            }
            other => panic!("Expected BatchWriteFailed, got {:?}", other)
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(JournalError::TransactionNotApplied { key: "k".to_string() }.is_transient());
        assert!(JournalError::batch_write_failed("a", JournalError::Store("timeout".to_string())).is_transient());
        assert!(!JournalError::batch_write_failed("a", JournalError::Encoding("bad".to_string())).is_transient());
        assert!(!JournalError::InvalidRequest("empty".to_string()).is_transient());
        assert!(!JournalError::Decoding("garbage".to_string()).is_transient());
    }
}

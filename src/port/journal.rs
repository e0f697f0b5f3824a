use async_trait::async_trait;

use crate::domain::{
    error::JournalError,
    record::{AtomicWrite, PersistentRepr}
};

/// Journal abstraction for event persistence
///
/// The persistence_id names one entity's stream; sequence numbers are assigned by the caller.
#[async_trait]
pub trait Journal: Send + Sync {
    /// Persist a batch of atomic writes. Returns one outcome per write, in input order.
    async fn write_messages(&self, messages: Vec<AtomicWrite>) -> Vec<Result<(), JournalError>>;

    /// Replay `from_sequence_nr..=to_sequence_nr`, at most `max` records, in sequence order
    async fn replay_messages(
        &self,
        persistence_id: &str,
        from_sequence_nr: u64,
        to_sequence_nr: u64,
        max: u64,
        recovery_callback: &mut (dyn FnMut(PersistentRepr) + Send)
    ) -> Result<(), JournalError>;

    /// Get highest sequence number ever written for a persistence_id
    async fn read_highest_sequence_nr(&self, persistence_id: &str) -> Result<u64, JournalError>;

    /// Delete records up to and including `to_sequence_nr` (for retention)
    async fn delete_messages_to(&self, persistence_id: &str, to_sequence_nr: u64) -> Result<(), JournalError>;
}

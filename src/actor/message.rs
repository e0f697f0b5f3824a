//! Typed messages for the journal actor

use ractor::{Message, RpcReplyPort};

use crate::domain::{
    error::JournalError,
    record::{AtomicWrite, PersistentRepr}
};

/// Result of a recovery request: the replayed slice and the stream's cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredMessages {
    pub messages:            Vec<PersistentRepr>,
    pub highest_sequence_nr: u64
}

/// Messages for the journal actor
#[derive(Debug)]
pub enum JournalMessage {
    /// Persist a batch, replying with one outcome per atomic write
    WriteMessages { messages: Vec<AtomicWrite>, reply: RpcReplyPort<Vec<Result<(), JournalError>>> },
    /// Replay a range, then read the highest sequence number
    ReplayMessages {
        persistence_id:   String,
        from_sequence_nr: u64,
        to_sequence_nr:   u64,
        max:              u64,
        reply:            RpcReplyPort<Result<RecoveredMessages, JournalError>>
    },
    /// Read the highest sequence number of a stream
    ReadHighestSequenceNr { persistence_id: String, reply: RpcReplyPort<Result<u64, JournalError>> },
    /// Delete records up to and including a sequence number
    DeleteMessagesTo { persistence_id: String, to_sequence_nr: u64, reply: RpcReplyPort<Result<(), JournalError>> }
}

impl JournalMessage {
    pub fn name(&self) -> &'static str {
        match self {
            JournalMessage::WriteMessages { .. } => "write_messages",
            JournalMessage::ReplayMessages { .. } => "replay_messages",
            JournalMessage::ReadHighestSequenceNr { .. } => "read_highest_sequence_nr",
            JournalMessage::DeleteMessagesTo { .. } => "delete_messages_to"
        }
    }
}

// Implement Message trait for Ractor
impl Message for JournalMessage {}

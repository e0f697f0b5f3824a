//! Domain Events - Structured events for internal monitoring and debugging

/// Journal engine events
pub mod journal {
    pub const BATCH_RECEIVED: &str = "batch.received";
    pub const BATCH_COMPLETED: &str = "batch.completed";
    pub const REQUEST_REJECTED: &str = "request.rejected";
    pub const STREAM_WRITTEN: &str = "stream.written";
    pub const STREAM_WRITE_FAILED: &str = "stream.write_failed";
    pub const REPLAY_STARTED: &str = "replay.started";
    pub const REPLAY_COMPLETED: &str = "replay.completed";
    pub const REPLAY_FAILED: &str = "replay.failed";
    pub const HIGHEST_SEQUENCE_READ: &str = "highest_sequence.read";
    pub const MESSAGES_DELETED: &str = "messages.deleted";
}

/// Stream store events
pub mod stream_store {
    pub const STORE_OPENED: &str = "store.opened";
    pub const STORE_OPEN_FAILED: &str = "store.open_failed";
    pub const TRANSACTION_EXECUTED: &str = "transaction.executed";
    pub const TRANSACTION_FAILED: &str = "transaction.failed";
}

/// Journal actor events
pub mod journal_actor {
    pub const ACTOR_STARTED: &str = "journal_actor.started";
    pub const ACTOR_STOPPED: &str = "journal_actor.stopped";
    pub const REQUEST_RECEIVED: &str = "request.received";
    pub const REPLY_FAILED: &str = "reply.failed";
}

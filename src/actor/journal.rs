//! Journal Actor - the journal as seen by persistent actors
//!
//! Each request runs on its own task, so a slow stream never holds up
//! requests for other persistence ids. Callers are expected to keep at most
//! one write in flight per persistence id.

use std::{sync::Arc, time::Duration};

use ractor::{
    Actor, ActorProcessingErr, ActorRef, RpcReplyPort,
    rpc::{CallResult, call}
};
use tokio::task::JoinHandle;
use tracing::{Level, event};

use crate::{
    actor::message::{JournalMessage, RecoveredMessages},
    config::JournalSettings,
    domain::{
        constant::journal_actor,
        error::JournalError,
        record::{AtomicWrite, PersistentRepr}
    },
    journal::KvJournal,
    port::{journal::Journal, serializer::Serializer}
};

/// Replay a range and read the cursor, the two steps of recovering a persistent actor
pub async fn recover(
    journal: &dyn Journal,
    persistence_id: &str,
    from_sequence_nr: u64,
    to_sequence_nr: u64,
    max: u64
) -> Result<RecoveredMessages, JournalError> {
    let mut messages = Vec::new();
    journal
        .replay_messages(persistence_id, from_sequence_nr, to_sequence_nr, max, &mut |r: PersistentRepr| {
            messages.push(r)
        })
        .await?;

    let highest_sequence_nr = journal.read_highest_sequence_nr(persistence_id).await?;

    Ok(RecoveredMessages { messages, highest_sequence_nr })
}

/// Journal Actor State
pub struct JournalActorState {
    journal: Arc<dyn Journal>
}

/// Journal Actor - serves journal requests from persistent actors
pub struct JournalActor;

#[async_trait::async_trait]
impl Actor for JournalActor {
    type Arguments = Arc<dyn Journal>;
    type Msg = JournalMessage;
    type State = JournalActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        journal: Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        event!(Level::DEBUG, event = journal_actor::ACTOR_STARTED);
        Ok(JournalActorState { journal })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        _state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        event!(Level::DEBUG, event = journal_actor::ACTOR_STOPPED);
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        event!(Level::DEBUG, event = journal_actor::REQUEST_RECEIVED, request = message.name());

        tokio::spawn(Self::serve(state.journal.clone(), message));
        Ok(())
    }
}

impl JournalActor {
    async fn serve(journal: Arc<dyn Journal>, message: JournalMessage) {
        let request = message.name();

        match message {
            JournalMessage::WriteMessages { messages, reply } => {
                let outcomes = journal.write_messages(messages).await;
                Self::send_reply(reply, outcomes, request);
            }
            JournalMessage::ReplayMessages { persistence_id, from_sequence_nr, to_sequence_nr, max, reply } => {
                let result = recover(journal.as_ref(), &persistence_id, from_sequence_nr, to_sequence_nr, max).await;
                Self::send_reply(reply, result, request);
            }
            JournalMessage::ReadHighestSequenceNr { persistence_id, reply } => {
                let result = journal.read_highest_sequence_nr(&persistence_id).await;
                Self::send_reply(reply, result, request);
            }
            JournalMessage::DeleteMessagesTo { persistence_id, to_sequence_nr, reply } => {
                let result = journal.delete_messages_to(&persistence_id, to_sequence_nr).await;
                Self::send_reply(reply, result, request);
            }
        }
    }

    fn send_reply<T: Send + 'static>(reply: RpcReplyPort<T>, value: T, request: &'static str) {
        if let Err(e) = reply.send(value) {
            event!(Level::WARN, event = journal_actor::REPLY_FAILED, request = request, error = %e);
        }
    }
}

/// Client handle for the journal actor
#[derive(Clone)]
pub struct JournalRef {
    actor:   ActorRef<JournalMessage>,
    timeout: Duration
}

impl JournalRef {
    /// Spawn a journal actor serving `journal`
    pub async fn spawn(journal: Arc<dyn Journal>, timeout: Duration) -> Result<(Self, JoinHandle<()>), JournalError> {
        let (actor, handle) = Actor::spawn(None, JournalActor, journal).await?;
        Ok((Self { actor, timeout }, handle))
    }

    /// Open the configured store and spawn a journal actor on top of it
    pub async fn start(
        settings: &JournalSettings,
        serializer: Arc<dyn Serializer>
    ) -> Result<(Self, JoinHandle<()>), JournalError> {
        let journal = KvJournal::connect(settings, serializer)?;
        Self::spawn(Arc::new(journal), settings.call_timeout()).await
    }

    pub fn actor(&self) -> &ActorRef<JournalMessage> {
        &self.actor
    }

    pub fn stop(&self) {
        self.actor.stop(None);
    }

    pub async fn write_messages(
        &self,
        messages: Vec<AtomicWrite>
    ) -> Result<Vec<Result<(), JournalError>>, JournalError> {
        self.request(|reply| JournalMessage::WriteMessages { messages, reply }).await
    }

    pub async fn replay_messages(
        &self,
        persistence_id: &str,
        from_sequence_nr: u64,
        to_sequence_nr: u64,
        max: u64
    ) -> Result<RecoveredMessages, JournalError> {
        let persistence_id = persistence_id.to_string();
        self.request(|reply| JournalMessage::ReplayMessages {
            persistence_id,
            from_sequence_nr,
            to_sequence_nr,
            max,
            reply
        })
        .await?
    }

    pub async fn read_highest_sequence_nr(&self, persistence_id: &str) -> Result<u64, JournalError> {
        let persistence_id = persistence_id.to_string();
        self.request(|reply| JournalMessage::ReadHighestSequenceNr { persistence_id, reply }).await?
    }

    pub async fn delete_messages_to(&self, persistence_id: &str, to_sequence_nr: u64) -> Result<(), JournalError> {
        let persistence_id = persistence_id.to_string();
        self.request(|reply| JournalMessage::DeleteMessagesTo { persistence_id, to_sequence_nr, reply }).await?
    }

    async fn request<T, F>(&self, build: F) -> Result<T, JournalError>
    where
        T: Send + 'static,
        F: FnOnce(RpcReplyPort<T>) -> JournalMessage
    {
        match call(&self.actor, build, Some(self.timeout)).await {
            Ok(CallResult::Success(value)) => Ok(value),
            Ok(CallResult::Timeout) => {
                Err(JournalError::Actor(format!("journal request timed out after {} ms", self.timeout.as_millis())))
            }
            Ok(CallResult::SenderError) => Err(JournalError::Actor("journal actor dropped the request".to_string())),
            Err(e) => Err(JournalError::Actor(format!("failed to reach journal actor: {:?}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::serializer::JsonSerializer,
        testing::{Fault, FaultyStore}
    };

    fn record(persistence_id: &str, sequence_nr: u64) -> PersistentRepr {
        PersistentRepr::new(persistence_id, sequence_nr, format!("{}-{}", persistence_id, sequence_nr).into_bytes())
    }

    #[tokio::test]
    async fn test_journal_actor_round_trip() {
        let (journal, handle) =
            JournalRef::start(&JournalSettings::default(), Arc::new(JsonSerializer::new())).await.unwrap();

        let outcomes = journal
            .write_messages(vec![
                AtomicWrite::new("cart-1", vec![record("cart-1", 1), record("cart-1", 2)]),
                AtomicWrite::single(record("cart-2", 1)),
                AtomicWrite::single(record("cart-1", 3)),
            ])
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.is_ok()));

        let recovered = journal.replay_messages("cart-1", 2, u64::MAX, u64::MAX).await.unwrap();
        assert_eq!(recovered.messages.iter().map(|r| r.sequence_nr).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(recovered.highest_sequence_nr, 3);

        journal.delete_messages_to("cart-1", 3).await.unwrap();
        let recovered = journal.replay_messages("cart-1", 1, u64::MAX, u64::MAX).await.unwrap();
        assert!(recovered.messages.is_empty());
        assert_eq!(recovered.highest_sequence_nr, 3);

        assert_eq!(journal.read_highest_sequence_nr("cart-2").await.unwrap(), 1);
        assert_eq!(journal.read_highest_sequence_nr("cart-3").await.unwrap(), 0);

        journal.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_stream_does_not_block_other_requests() {
        let store = Arc::new(FaultyStore::new());
        // Never satisfied: the write for "stuck" hangs until the call times out
        store.fail_transactions_on("j:stuck", Fault::WaitFor("never".to_string()));
        let kv = KvJournal::new("j", store, Arc::new(JsonSerializer::new()));

        let (journal, _handle) = JournalRef::spawn(Arc::new(kv), Duration::from_millis(200)).await.unwrap();

        let stuck = {
            let journal = journal.clone();
            tokio::spawn(async move { journal.write_messages(vec![AtomicWrite::single(record("stuck", 1))]).await })
        };

        let outcomes = journal.write_messages(vec![AtomicWrite::single(record("free", 1))]).await.unwrap();
        assert!(outcomes[0].is_ok());

        let err = stuck.await.unwrap().unwrap_err();
        assert!(matches!(err, JournalError::Actor(_)));
        assert!(err.is_transient());

        journal.stop();
    }
}

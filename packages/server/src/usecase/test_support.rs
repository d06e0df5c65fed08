//! Helpers shared by the usecase unit tests.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionHandle, Participant, ParticipantId, ServerEvent},
    infrastructure::{registry::InMemoryConnectionRegistry, repository::InMemoryChatRepository},
};

use super::RelayTimeouts;

pub(crate) fn pid(id: &str) -> ParticipantId {
    ParticipantId::new(id.to_string()).unwrap()
}

pub(crate) fn fast_timeouts() -> RelayTimeouts {
    RelayTimeouts {
        verify: Duration::from_millis(100),
        store: Duration::from_millis(100),
        send: Duration::from_millis(20),
    }
}

pub(crate) async fn seeded_repository(ids: &[&str]) -> Arc<InMemoryChatRepository> {
    let repository = Arc::new(InMemoryChatRepository::new());
    for id in ids {
        repository
            .upsert_participant(Participant::new(
                pid(id),
                id.to_string(),
                format!("{}@example.com", id),
            ))
            .await;
    }
    repository
}

pub(crate) fn create_test_registry() -> Arc<InMemoryConnectionRegistry> {
    Arc::new(InMemoryConnectionRegistry::new())
}

/// Handle plus the receiving end of its queue.
pub(crate) fn open_connection() -> (ConnectionHandle, mpsc::Receiver<ServerEvent>) {
    let (handle, mailbox) = ConnectionHandle::channel(8);
    let (inbound, _signal) = mailbox.split();
    (handle, inbound)
}

/// Everything currently queued, without waiting.
pub(crate) fn drain(inbound: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = inbound.try_recv() {
        events.push(event);
    }
    events
}

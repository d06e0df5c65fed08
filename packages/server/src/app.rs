//! Dependency wiring shared by the binary and the integration tests.

use std::sync::Arc;

use crate::{
    domain::{IdentityVerifier, MessageRepository, ParticipantRepository},
    infrastructure::registry::InMemoryConnectionRegistry,
    ui::Server,
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, DispatchMessageUseCase,
        FetchMessagesUseCase, ListParticipantsUseCase, PublishPresenceUseCase, RelayTimeouts,
        SendMessageUseCase,
    },
};

/// Build a server around the given verifier and stores.
///
/// Dependencies are created in order:
/// 1. Connection registry
/// 2. Presence publisher and message dispatcher
/// 3. UseCases
/// 4. Server
pub fn build_server(
    verifier: Arc<dyn IdentityVerifier>,
    participants: Arc<dyn ParticipantRepository>,
    messages: Arc<dyn MessageRepository>,
    timeouts: RelayTimeouts,
    outbound_capacity: usize,
) -> Server {
    // 1. Connection registry (in-memory, never persisted)
    let registry = Arc::new(InMemoryConnectionRegistry::new());

    // 2. Presence publisher / message dispatcher
    let presence = Arc::new(PublishPresenceUseCase::new(
        registry.clone(),
        participants.clone(),
        timeouts,
    ));
    let dispatcher = Arc::new(DispatchMessageUseCase::new(
        registry.clone(),
        presence.clone(),
        timeouts,
    ));

    // 3. UseCases
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        verifier,
        registry.clone(),
        presence.clone(),
        timeouts,
    ));
    let disconnect_participant_usecase =
        Arc::new(DisconnectParticipantUseCase::new(registry.clone(), presence));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        participants.clone(),
        messages.clone(),
        dispatcher,
        timeouts,
    ));
    let fetch_messages_usecase = Arc::new(FetchMessagesUseCase::new(messages, timeouts));
    let list_participants_usecase =
        Arc::new(ListParticipantsUseCase::new(participants, timeouts));

    // 4. Server
    Server::new(
        connect_participant_usecase,
        disconnect_participant_usecase,
        send_message_usecase,
        fetch_messages_usecase,
        list_participants_usecase,
        registry,
        outbound_capacity,
    )
}

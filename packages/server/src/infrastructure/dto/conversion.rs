//! Conversion logic between DTOs and domain entities.

use denpo_shared::time::timestamp_to_rfc3339;

use crate::domain::{DirectMessage, Participant, PresenceEvent, ServerEvent};
use crate::infrastructure::dto::{
    http::{MessageDto, ParticipantDto},
    websocket::{DeliveryEventDto, EventType, PresenceEventDto},
};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<DirectMessage> for MessageDto {
    fn from(model: DirectMessage) -> Self {
        Self {
            id: model.id.to_string(),
            sender_id: model.sender_id.into_string(),
            recipient_id: model.recipient_id.into_string(),
            content: model.content.into_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
            read: model.read,
        }
    }
}

impl From<Participant> for ParticipantDto {
    fn from(model: Participant) -> Self {
        Self {
            id: model.id.into_string(),
            name: model.name,
            email: model.email,
            is_online: model.is_online,
        }
    }
}

impl From<PresenceEvent> for PresenceEventDto {
    fn from(model: PresenceEvent) -> Self {
        Self {
            r#type: EventType::Presence,
            participant_id: model.participant_id.into_string(),
            online: model.online,
        }
    }
}

impl From<DirectMessage> for DeliveryEventDto {
    fn from(model: DirectMessage) -> Self {
        Self {
            r#type: EventType::Delivery,
            message: model.into(),
        }
    }
}

/// Serialize a server event into the JSON text frame sent to the client.
pub fn encode_server_event(event: ServerEvent) -> Result<String, serde_json::Error> {
    match event {
        ServerEvent::Presence(presence) => serde_json::to_string(&PresenceEventDto::from(presence)),
        ServerEvent::Delivery(message) => serde_json::to_string(&DeliveryEventDto::from(message)),
    }
}

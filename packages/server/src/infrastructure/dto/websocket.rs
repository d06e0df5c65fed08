//! WebSocket event DTOs (server → client).

use serde::{Deserialize, Serialize};

use super::http::MessageDto;

/// Event type discriminator
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Presence,
    Delivery,
}

/// `{ "type": "presence", "participantId": "...", "online": true }`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEventDto {
    pub r#type: EventType,
    pub participant_id: String,
    pub online: bool,
}

/// `{ "type": "delivery", "id": ..., "senderId": ..., "recipientId": ..., "content": ..., "createdAt": ..., "read": ... }`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEventDto {
    pub r#type: EventType,
    #[serde(flatten)]
    pub message: MessageDto,
}

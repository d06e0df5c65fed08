//! Entities and events.

use super::value_object::{MessageContent, MessageId, ParticipantId, Timestamp};

/// Participant record as kept by the durable store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
    pub is_online: bool,
}

impl Participant {
    pub fn new(id: ParticipantId, name: String, email: String) -> Self {
        Self {
            id,
            name,
            email,
            is_online: false,
        }
    }
}

/// A direct message that has not been persisted yet.
///
/// The store assigns `id` and `created_at` on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: ParticipantId,
    pub recipient_id: ParticipantId,
    pub content: MessageContent,
}

/// Persisted direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMessage {
    pub id: MessageId,
    pub sender_id: ParticipantId,
    pub recipient_id: ParticipantId,
    pub content: MessageContent,
    pub created_at: Timestamp,
    pub read: bool,
}

impl DirectMessage {
    /// Whether this message belongs to the thread between `a` and `b` (either direction).
    pub fn is_between(&self, a: &ParticipantId, b: &ParticipantId) -> bool {
        (&self.sender_id == a && &self.recipient_id == b)
            || (&self.sender_id == b && &self.recipient_id == a)
    }

    pub fn involves(&self, participant_id: &ParticipantId) -> bool {
        &self.sender_id == participant_id || &self.recipient_id == participant_id
    }

    /// `read` only ever moves from false to true.
    pub fn mark_read(&mut self) -> bool {
        let changed = !self.read;
        self.read = true;
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEvent {
    pub participant_id: ParticipantId,
    pub online: bool,
}

/// Events pushed from the server onto a connection handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    Presence(PresenceEvent),
    Delivery(DirectMessage),
}

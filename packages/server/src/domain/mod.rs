//! Domain layer: value objects, entities and the seams (traits) the relay depends on.
//!
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod connection;
pub mod entity;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use connection::{CloseReason, CloseSignal, ConnectionHandle, ConnectionMailbox};
pub use entity::{DirectMessage, NewMessage, Participant, PresenceEvent, ServerEvent};
pub use error::{AuthError, LifecycleError, PushError, RepositoryError, ValueObjectError};
pub use identity::IdentityVerifier;
pub use lifecycle::{ConnectionLifecycle, ConnectionState};
pub use registry::ConnectionRegistry;
pub use repository::{MessageRepository, ParticipantRepository};
pub use value_object::{
    ConnectionId, Credential, MessageContent, MessageId, ParticipantId, Timestamp,
};

#[cfg(test)]
pub use identity::MockIdentityVerifier;
#[cfg(test)]
pub use repository::{MockMessageRepository, MockParticipantRepository};

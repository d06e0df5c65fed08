//! UseCase layer.
//!
//! 各ユースケースはコンストラクタで依存（Registry / Repository / Verifier）を受け取ります。
//! グローバルな状態には一切アクセスしません。

mod connect_participant;
mod disconnect_participant;
mod dispatch_message;
mod error;
mod fetch_messages;
mod keyed_lock;
mod list_participants;
mod publish_presence;
mod send_message;

#[cfg(test)]
mod test_support;

use std::{future::Future, time::Duration};

pub use connect_participant::{ConnectOutcome, ConnectParticipantUseCase};
pub use disconnect_participant::{DisconnectOutcome, DisconnectParticipantUseCase};
pub use dispatch_message::{DispatchMessageUseCase, DispatchReport};
pub use error::{FetchMessagesError, ListParticipantsError, SendMessageError};
pub use fetch_messages::FetchMessagesUseCase;
pub use list_participants::ListParticipantsUseCase;
pub use publish_presence::{PresenceReport, PublishPresenceUseCase};
pub use send_message::{SendMessageUseCase, SentMessage};

use crate::domain::RepositoryError;

/// Upper bounds for every operation that may suspend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayTimeouts {
    /// Identity verifier call
    pub verify: Duration,
    /// Durable store read / write
    pub store: Duration,
    /// Per-handle push deadline
    pub send: Duration,
}

impl Default for RelayTimeouts {
    fn default() -> Self {
        Self {
            verify: Duration::from_millis(2000),
            store: Duration::from_millis(2000),
            send: Duration::from_millis(250),
        }
    }
}

/// Run a store call, mapping an elapsed deadline to `RepositoryError::Timeout`.
async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| RepositoryError::Timeout)?
}

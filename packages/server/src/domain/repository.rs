//! Repository traits 定義
//!
//! 永続ストア（参加者とメッセージ）へのインターフェース。
//! UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。

use async_trait::async_trait;

use super::{
    entity::{DirectMessage, NewMessage, Participant},
    error::RepositoryError,
    value_object::{MessageId, ParticipantId},
};

/// Participant records with their online flag
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    async fn find_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<Participant>, RepositoryError>;

    async fn list_participants(&self) -> Result<Vec<Participant>, RepositoryError>;

    /// Mirror the online flag into the participant record
    async fn set_online(
        &self,
        participant_id: &ParticipantId,
        online: bool,
    ) -> Result<(), RepositoryError>;
}

/// Direct message records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message. The store assigns its id and creation time.
    async fn insert_message(&self, message: NewMessage) -> Result<DirectMessage, RepositoryError>;

    /// Thread between two participants, oldest first
    async fn find_messages_for_pair(
        &self,
        a: &ParticipantId,
        b: &ParticipantId,
    ) -> Result<Vec<DirectMessage>, RepositoryError>;

    /// Every message sent or received by `participant_id`, oldest first
    async fn find_messages_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<DirectMessage>, RepositoryError>;

    /// Mark the listed messages as read, restricted to those addressed to `recipient_id`.
    ///
    /// Returns the number of records that changed.
    async fn mark_read(
        &self,
        recipient_id: &ParticipantId,
        message_ids: &[MessageId],
    ) -> Result<usize, RepositoryError>;
}

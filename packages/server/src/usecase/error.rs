//! UseCase error types.

use thiserror::Error;

use crate::domain::RepositoryError;

/// メッセージ送信（REST 書き込み経路）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("Failed to send message: {0}")]
    Store(#[from] RepositoryError),
}

/// メッセージ一覧取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchMessagesError {
    #[error("Failed to fetch messages: {0}")]
    Store(#[from] RepositoryError),
}

/// 参加者一覧取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListParticipantsError {
    #[error("Current user not found")]
    CurrentParticipantNotFound,

    #[error("Failed to fetch users: {0}")]
    Store(#[from] RepositoryError),
}

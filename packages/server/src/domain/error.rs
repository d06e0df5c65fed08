//! Domain error types.

use thiserror::Error;

use super::lifecycle::ConnectionState;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("participant id must not be empty")]
    EmptyParticipantId,

    #[error("participant id must be at most {0} characters")]
    ParticipantIdTooLong(usize),

    #[error("message content must not be empty")]
    EmptyMessageContent,

    #[error("message content must be at most {0} characters")]
    MessageContentTooLong(usize),

    #[error("credential must not be empty")]
    EmptyCredential,

    #[error("invalid message id: {0}")]
    InvalidMessageId(String),
}

/// Authentication failures (connection is closed, never registered)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication error: No token provided")]
    MissingCredential,

    #[error("Authentication error: Invalid token")]
    InvalidCredential,

    #[error("Authentication error: Token expired")]
    ExpiredCredential,

    #[error("Authentication error: Verification timed out")]
    Timeout,
}

/// Transport failures while pushing onto a connection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("connection is closed")]
    Closed,

    #[error("send deadline exceeded")]
    DeadlineExceeded,
}

/// Durable store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("participant not found: {0}")]
    ParticipantNotFound(String),

    #[error("store operation timed out")]
    Timeout,

    #[error("store failure: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("illegal connection state transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
}

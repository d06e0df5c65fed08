//! Mapping from usecase errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    domain::{AuthError, LifecycleError, RepositoryError, ValueObjectError},
    infrastructure::dto::http::ErrorResponse,
    usecase::{FetchMessagesError, ListParticipantsError, SendMessageError},
};

/// Error returned by every HTTP handler, rendered as `{ "error": "..." }`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// The durable store did not answer in time
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn from_store(context: &str, error: RepositoryError) -> Self {
        tracing::error!("{}: {}", context, error);
        match error {
            RepositoryError::Timeout => ApiError::Unavailable(context.to_string()),
            _ => ApiError::Internal(context.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(error: ValueObjectError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<LifecycleError> for ApiError {
    fn from(error: LifecycleError) -> Self {
        tracing::error!("{}", error);
        ApiError::Internal("Internal server error".to_string())
    }
}

impl From<SendMessageError> for ApiError {
    fn from(error: SendMessageError) -> Self {
        match error {
            SendMessageError::RecipientNotFound(_) => {
                ApiError::NotFound("Recipient not found".to_string())
            }
            SendMessageError::Store(e) => ApiError::from_store("Failed to send message", e),
        }
    }
}

impl From<FetchMessagesError> for ApiError {
    fn from(error: FetchMessagesError) -> Self {
        match error {
            FetchMessagesError::Store(e) => ApiError::from_store("Failed to fetch messages", e),
        }
    }
}

impl From<ListParticipantsError> for ApiError {
    fn from(error: ListParticipantsError) -> Self {
        match error {
            ListParticipantsError::CurrentParticipantNotFound => {
                ApiError::NotFound("Current user not found".to_string())
            }
            ListParticipantsError::Store(e) => ApiError::from_store("Failed to fetch users", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_are_unauthorized_with_message() {
        // テスト項目: 認証エラーは 401 で、メッセージから理由が判別できる
        // given (前提条件):
        let error = ApiError::from(AuthError::ExpiredCredential);

        // when (操作):
        let status = error.status_code();

        // then (期待する結果):
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error.to_string(), "Authentication error: Token expired");
    }

    #[test]
    fn test_store_timeout_maps_to_service_unavailable() {
        // テスト項目: ストアのタイムアウトは 503、その他のストア障害は 500
        // given (前提条件):
        let timeout = ApiError::from(SendMessageError::Store(RepositoryError::Timeout));
        let backend = ApiError::from(FetchMessagesError::Store(RepositoryError::Backend(
            "disk".to_string(),
        )));

        // when (操作):
        let statuses = (timeout.status_code(), backend.status_code());

        // then (期待する結果):
        assert_eq!(
            statuses,
            (
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::INTERNAL_SERVER_ERROR
            )
        );
        assert_eq!(backend.to_string(), "Failed to fetch messages");
    }

    #[test]
    fn test_unknown_recipient_maps_to_not_found() {
        // テスト項目: 存在しない受信者は 404
        // given (前提条件):
        let error = ApiError::from(SendMessageError::RecipientNotFound("ghost".to_string()));

        // when (操作):
        let status = error.status_code();

        // then (期待する結果):
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

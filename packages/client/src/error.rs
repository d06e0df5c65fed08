//! Error types for the Denpo client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the token (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Another session of the same participant took over the connection
    #[error("Connection was replaced by another session")]
    Replaced,

    /// The handshake could not be completed
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An established connection was lost
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The REST API answered with an error body
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Input line could not be understood
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

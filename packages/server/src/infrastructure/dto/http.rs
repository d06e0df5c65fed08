//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// Message record as exposed over HTTP and inside delivery events
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    /// RFC 3339 (UTC)
    pub created_at: String,
    pub read: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_online: bool,
}

/// Body of `POST /api/messages`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,
    pub recipient_id: String,
}

/// Query of `GET /api/messages`
#[derive(Deserialize, Debug, Default)]
pub struct MessagesQuery {
    /// Restrict to the thread with this participant
    pub with: Option<String>,
}

/// `{ "error": "..." }`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Entry of `GET /debug/connections`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDto {
    pub participant_id: String,
    pub connection_id: String,
}

//! REST API client.

use denpo_server::infrastructure::dto::http::{
    ErrorResponse, MessageDto, ParticipantDto, SendMessageRequest,
};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Thin wrapper over the relay's HTTP endpoints, authenticated with a bearer token
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// # Arguments
    ///
    /// * `base_url` - e.g. `http://127.0.0.1:8080`
    /// * `token` - Bearer token for every request
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// `GET /api/users` (the caller comes first)
    pub async fn list_users(&self) -> Result<Vec<ParticipantDto>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/users"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        decode(response).await
    }

    /// `GET /api/messages`: full fetch of everything sent or received
    pub async fn fetch_messages(&self) -> Result<Vec<MessageDto>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/messages"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        decode(response).await
    }

    /// `POST /api/messages`
    pub async fn send_message(
        &self,
        recipient_id: &str,
        content: &str,
    ) -> Result<MessageDto, ClientError> {
        let request = SendMessageRequest {
            content: content.to_string(),
            recipient_id: recipient_id.to_string(),
        };
        let response = self
            .http
            .post(self.url("/api/messages"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a success body, or turn the `{ "error": ... }` body into a `ClientError`
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    Err(error_for_status(status, message))
}

fn error_for_status(status: StatusCode, message: String) -> ClientError {
    if status == StatusCode::UNAUTHORIZED {
        ClientError::Unauthorized(message)
    } else {
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

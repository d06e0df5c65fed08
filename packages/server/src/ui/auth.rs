//! Credential extraction for HTTP requests.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::domain::{Credential, ParticipantId};

use super::{error::ApiError, state::AppState};

/// Read `Authorization: Bearer <token>`.
pub fn bearer_credential(headers: &HeaderMap) -> Option<Credential> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    Credential::new(token.to_string()).ok()
}

/// Participant authenticated from the request's bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedParticipant(pub ParticipantId);

impl FromRequestParts<Arc<AppState>> for AuthenticatedParticipant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let credential = bearer_credential(&parts.headers);
        let participant_id = state
            .connect_participant_usecase
            .authenticate(credential)
            .await
            .inspect_err(|e| tracing::debug!("Rejected {} {}: {}", parts.method, parts.uri, e))?;
        Ok(Self(participant_id))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_credential_is_extracted() {
        // テスト項目: Bearer トークンが取り出せる
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));

        // when (操作):
        let credential = bearer_credential(&headers);

        // then (期待する結果):
        assert_eq!(credential.unwrap().expose(), "abc.def.ghi");
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        // テスト項目: Bearer 以外のスキームや空トークンは資格情報なしとして扱う
        // given (前提条件):
        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        let mut empty = HeaderMap::new();
        empty.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));

        // when (操作):
        let results = (bearer_credential(&basic), bearer_credential(&empty));

        // then (期待する結果):
        assert!(results.0.is_none());
        assert!(results.1.is_none());
        assert!(bearer_credential(&HeaderMap::new()).is_none());
    }
}

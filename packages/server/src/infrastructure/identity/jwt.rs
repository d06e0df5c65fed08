//! JWT (HS256) を使った IdentityVerifier 実装
//!
//! トークンの発行自体はリレーの外側（ログイン API）の責務ですが、
//! 開発用 CLI とテストのために `issue_token` も提供します。

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, Credential, IdentityVerifier, Participant, ParticipantId};

/// Token payload: `{ id, email, name, iat, exp }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Participant ID
    pub id: String,
    pub email: String,
    pub name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

pub struct JwtIdentityVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `participant`, valid for `ttl_secs` seconds.
    pub fn issue_token(
        &self,
        participant: &Participant,
        ttl_secs: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: participant.id.as_str().to_string(),
            email: participant.email.clone(),
            name: participant.name.clone(),
            iat: now,
            exp: now + ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
                _ => AuthError::InvalidCredential,
            })
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &Credential) -> Result<ParticipantId, AuthError> {
        let claims = self.decode_claims(credential.expose())?;
        ParticipantId::new(claims.id).map_err(|_| AuthError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Participant {
        Participant::new(
            ParticipantId::new("alice".to_string()).unwrap(),
            "Alice".to_string(),
            "alice@example.com".to_string(),
        )
    }

    fn credential(token: String) -> Credential {
        Credential::new(token).unwrap()
    }

    #[tokio::test]
    async fn test_verify_issued_token() {
        // テスト項目: 発行したトークンを検証すると参加者 ID が得られる
        // given (前提条件):
        let verifier = JwtIdentityVerifier::new(b"test-secret");
        let token = verifier.issue_token(&alice(), 60).unwrap();

        // when (操作):
        let result = verifier.verify(&credential(token)).await;

        // then (期待する結果):
        assert_eq!(result, Ok(alice().id));
    }

    #[tokio::test]
    async fn test_verify_expired_token() {
        // テスト項目: 期限切れトークンは ExpiredCredential として区別される
        // given (前提条件):
        let verifier = JwtIdentityVerifier::new(b"test-secret");
        let token = verifier.issue_token(&alice(), -3600).unwrap();

        // when (操作):
        let result = verifier.verify(&credential(token)).await;

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::ExpiredCredential));
    }

    #[tokio::test]
    async fn test_verify_token_signed_with_other_secret() {
        // テスト項目: 別の鍵で署名されたトークンは InvalidCredential
        // given (前提条件):
        let issuer = JwtIdentityVerifier::new(b"other-secret");
        let verifier = JwtIdentityVerifier::new(b"test-secret");
        let token = issuer.issue_token(&alice(), 60).unwrap();

        // when (操作):
        let result = verifier.verify(&credential(token)).await;

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_verify_garbage_token() {
        // テスト項目: JWT 形式でない文字列は InvalidCredential
        // given (前提条件):
        let verifier = JwtIdentityVerifier::new(b"test-secret");

        // when (操作):
        let result = verifier.verify(&credential("not-a-jwt".to_string())).await;

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::InvalidCredential));
    }
}

//! Identity verifier trait.

use async_trait::async_trait;

use super::{error::AuthError, value_object::Credential, value_object::ParticipantId};

/// Turns an opaque credential into a stable participant identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &Credential) -> Result<ParticipantId, AuthError>;
}

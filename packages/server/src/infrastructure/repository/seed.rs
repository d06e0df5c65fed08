//! Participant seed file loader.
//!
//! 登録 API はリレーの外側にあるため、開発用にはシードファイルから参加者を投入します。
//!
//! ```json
//! [
//!   { "id": "alice", "name": "Alice", "email": "alice@example.com" }
//! ]
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Participant, ParticipantId, ValueObjectError};

use super::InMemoryChatRepository;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid participant in seed file: {0}")]
    InvalidParticipant(#[from] ValueObjectError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedParticipant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl TryFrom<SeedParticipant> for Participant {
    type Error = ValueObjectError;

    fn try_from(seed: SeedParticipant) -> Result<Self, Self::Error> {
        Ok(Participant::new(
            ParticipantId::new(seed.id)?,
            seed.name,
            seed.email,
        ))
    }
}

/// Parse seed JSON into participants.
pub fn parse_seed(json: &str) -> Result<Vec<Participant>, SeedError> {
    let seeds: Vec<SeedParticipant> = serde_json::from_str(json)?;
    seeds
        .into_iter()
        .map(|seed| Participant::try_from(seed).map_err(SeedError::from))
        .collect()
}

/// Load a seed file into `repository`. Returns the number of participants added.
pub async fn load_seed_file(
    repository: &InMemoryChatRepository,
    path: &Path,
) -> Result<usize, SeedError> {
    let json = tokio::fs::read_to_string(path).await?;
    let participants = parse_seed(&json)?;
    let count = participants.len();
    for participant in participants {
        repository.upsert_participant(participant).await;
    }
    tracing::info!("Seeded {} participants from {}", count, path.display());
    Ok(count)
}

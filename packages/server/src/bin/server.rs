//! Direct-message relay server.
//!
//! Participants connect over WebSocket with a bearer token and receive presence and
//! delivery events; messages are sent and listed over HTTP.
//!
//! Run with:
//! ```not_rust
//! DENPO_JWT_SECRET=dev-secret cargo run --bin denpo-server -- --seed-file packages/server/seed/participants.json
//! cargo run --bin denpo-server -- --jwt-secret dev-secret --seed-file packages/server/seed/participants.json --port 3000
//! cargo run --bin denpo-server -- --jwt-secret dev-secret --seed-file packages/server/seed/participants.json --issue-token alice
//! ```

use std::sync::Arc;

use clap::Parser;
use denpo_server::{
    app::build_server,
    config::ServerConfig,
    domain::{ParticipantId, ParticipantRepository},
    infrastructure::{
        identity::JwtIdentityVerifier,
        repository::{InMemoryChatRepository, load_seed_file},
    },
};
use denpo_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger("denpo_server", env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::parse();

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // 1. Durable store (in-memory stand-in)
    let repository = Arc::new(InMemoryChatRepository::new());
    if let Some(path) = &config.seed_file {
        load_seed_file(&repository, path).await?;
    }

    // 2. Identity verifier
    let verifier = Arc::new(JwtIdentityVerifier::new(config.jwt_secret.as_bytes()));

    if let Some(id) = &config.issue_token {
        let participant_id = ParticipantId::new(id.clone())?;
        let participant = repository
            .find_participant(&participant_id)
            .await?
            .ok_or_else(|| format!("participant '{}' is not in the seed file", participant_id))?;
        println!("{}", verifier.issue_token(&participant, config.token_ttl_secs)?);
        return Ok(());
    }

    // 3. Server
    let server = build_server(
        verifier,
        repository.clone(),
        repository,
        config.timeouts(),
        config.outbound_capacity(),
    );
    server.run(config.host, config.port).await
}

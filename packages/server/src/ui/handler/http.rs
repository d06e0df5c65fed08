//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    domain::{MessageContent, ParticipantId},
    infrastructure::dto::http::{
        ConnectionDto, MessageDto, MessagesQuery, ParticipantDto, SendMessageRequest,
    },
    ui::{auth::AuthenticatedParticipant, error::ApiError, state::AppState},
};

/// Debug endpoint listing the current registry entries (for testing purposes)
pub async fn debug_connections(State(state): State<Arc<AppState>>) -> Json<Vec<ConnectionDto>> {
    let mut connections: Vec<ConnectionDto> = state
        .registry
        .snapshot()
        .await
        .into_iter()
        .map(|(participant_id, handle)| ConnectionDto {
            participant_id: participant_id.into_string(),
            connection_id: handle.id().to_string(),
        })
        .collect();
    connections.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));
    Json(connections)
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// `GET /api/users`: the caller first, then everyone else with their online flag
pub async fn get_users(
    State(state): State<Arc<AppState>>,
    AuthenticatedParticipant(me): AuthenticatedParticipant,
) -> Result<Json<Vec<ParticipantDto>>, ApiError> {
    let participants = state.list_participants_usecase.execute(&me).await?;

    // Domain Model から DTO への変換
    Ok(Json(participants.into_iter().map(Into::into).collect()))
}

/// `GET /api/messages[?with=<id>]`: every message the caller sent or received, oldest first
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    AuthenticatedParticipant(me): AuthenticatedParticipant,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let with = query.with.map(ParticipantId::new).transpose()?;
    let messages = state.fetch_messages_usecase.execute(&me, with).await?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// `POST /api/messages`: persist, then deliver to the live connections of both parties
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    AuthenticatedParticipant(me): AuthenticatedParticipant,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    // String から Domain Model への変換
    let recipient_id = ParticipantId::new(request.recipient_id)?;
    let content = MessageContent::new(request.content)?;

    let sent = state
        .send_message_usecase
        .execute(me, recipient_id, content)
        .await?;

    Ok((StatusCode::CREATED, Json(sent.message.into())))
}

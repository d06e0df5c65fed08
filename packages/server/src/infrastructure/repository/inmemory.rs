//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ParticipantRepository / MessageRepository trait の具体的な実装。
//! HashMap と Vec をインメモリ DB として使用します。
//!
//! 本番では外部の永続ストアに置き換える想定で、リレーのコアはこの trait 越しにしか触りません。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use denpo_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    DirectMessage, MessageId, MessageRepository, NewMessage, Participant, ParticipantId,
    ParticipantRepository, RepositoryError, Timestamp,
};

/// インメモリの参加者 + メッセージストア
pub struct InMemoryChatRepository {
    participants: Mutex<HashMap<ParticipantId, Participant>>,
    /// 挿入順（= created_at 昇順）で保持
    messages: Mutex<Vec<DirectMessage>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            participants: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// Add or replace a participant record (registration happens outside the relay).
    pub async fn upsert_participant(&self, participant: Participant) {
        let mut participants = self.participants.lock().await;
        participants.insert(participant.id.clone(), participant);
    }
}

impl Default for InMemoryChatRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryChatRepository {
    async fn find_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<Participant>, RepositoryError> {
        let participants = self.participants.lock().await;
        Ok(participants.get(participant_id).cloned())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, RepositoryError> {
        let participants = self.participants.lock().await;
        let mut all: Vec<Participant> = participants.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn set_online(
        &self,
        participant_id: &ParticipantId,
        online: bool,
    ) -> Result<(), RepositoryError> {
        let mut participants = self.participants.lock().await;
        let participant = participants
            .get_mut(participant_id)
            .ok_or_else(|| RepositoryError::ParticipantNotFound(participant_id.to_string()))?;
        participant.is_online = online;
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for InMemoryChatRepository {
    async fn insert_message(&self, message: NewMessage) -> Result<DirectMessage, RepositoryError> {
        let mut messages = self.messages.lock().await;

        // created_at は単調非減少に保つ（時計が戻っても順序が崩れないように）
        let now = self.clock.now_millis();
        let created_at = messages
            .last()
            .map(|last| last.created_at.value().max(now))
            .unwrap_or(now);

        let record = DirectMessage {
            id: MessageId::generate(),
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            content: message.content,
            created_at: Timestamp::new(created_at),
            read: false,
        };
        messages.push(record.clone());
        Ok(record)
    }

    async fn find_messages_for_pair(
        &self,
        a: &ParticipantId,
        b: &ParticipantId,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(messages
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect())
    }

    async fn find_messages_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(messages
            .iter()
            .filter(|m| m.involves(participant_id))
            .cloned()
            .collect())
    }

    async fn mark_read(
        &self,
        recipient_id: &ParticipantId,
        message_ids: &[MessageId],
    ) -> Result<usize, RepositoryError> {
        let targets: HashSet<&MessageId> = message_ids.iter().collect();
        let mut messages = self.messages.lock().await;
        let changed = messages
            .iter_mut()
            .filter(|m| &m.recipient_id == recipient_id && targets.contains(&m.id))
            .map(|m| m.mark_read())
            .filter(|changed| *changed)
            .count();
        Ok(changed)
    }
}

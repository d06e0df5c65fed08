//! UseCase: メッセージ一覧取得
//!
//! 接続（再接続）のたびにクライアントが呼び出し、オフライン中に届いたメッセージを回収します。
//! 返すのは既読化する前のレコードなので、クライアントは未読を判別できます。

use std::sync::Arc;

use crate::domain::{DirectMessage, MessageId, MessageRepository, ParticipantId};

use super::{RelayTimeouts, bounded, error::FetchMessagesError};

/// メッセージ一覧取得のユースケース
pub struct FetchMessagesUseCase {
    messages: Arc<dyn MessageRepository>,
    timeouts: RelayTimeouts,
}

impl FetchMessagesUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>, timeouts: RelayTimeouts) -> Self {
        Self { messages, timeouts }
    }

    /// `participant_id` が送受信したメッセージを古い順に返す
    ///
    /// `with` を指定するとその相手とのスレッドだけを返す。
    /// 既読にするのは今回返したメッセージのうち `participant_id` 宛ての未読分だけで、
    /// 一覧の取得後に届いたメッセージは未読のまま残る。
    pub async fn execute(
        &self,
        participant_id: &ParticipantId,
        with: Option<ParticipantId>,
    ) -> Result<Vec<DirectMessage>, FetchMessagesError> {
        let mut messages = match &with {
            Some(other) => {
                bounded(
                    self.timeouts.store,
                    self.messages.find_messages_for_pair(participant_id, other),
                )
                .await?
            }
            None => {
                bounded(
                    self.timeouts.store,
                    self.messages.find_messages_for_participant(participant_id),
                )
                .await?
            }
        };
        messages.sort_by_key(|m| m.created_at);

        let unread: Vec<MessageId> = messages
            .iter()
            .filter(|m| &m.recipient_id == participant_id && !m.read)
            .map(|m| m.id)
            .collect();
        if unread.is_empty() {
            return Ok(messages);
        }

        match bounded(
            self.timeouts.store,
            self.messages.mark_read(participant_id, &unread),
        )
        .await
        {
            Ok(changed) => {
                tracing::debug!("Marked {} messages to '{}' as read", changed, participant_id)
            }
            // 既読化の失敗は一覧の返却を妨げない
            Err(e) => tracing::warn!("Failed to mark messages read for '{}': {}", participant_id, e),
        }

        Ok(messages)
    }
}

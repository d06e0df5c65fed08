//! UseCase: メッセージ配信（Message Dispatcher）
//!
//! 永続化済みのメッセージを送信者と受信者の現在の接続へ届けます。
//! 配信はベストエフォートで、再送はしません。受信者がオフラインでもエラーにはならず、
//! 次回接続時の一覧取得で回収されます。

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, DirectMessage, ParticipantId, ServerEvent};

use super::{PublishPresenceUseCase, RelayTimeouts};

/// Result of one `dispatch` call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Participants whose live connection accepted the delivery
    pub delivered_to: Vec<ParticipantId>,
    /// Participants whose connection failed the push and was evicted
    pub failed: Vec<ParticipantId>,
}

/// メッセージ配信のユースケース
pub struct DispatchMessageUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    presence: Arc<PublishPresenceUseCase>,
    timeouts: RelayTimeouts,
}

impl DispatchMessageUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        presence: Arc<PublishPresenceUseCase>,
        timeouts: RelayTimeouts,
    ) -> Self {
        Self {
            registry,
            presence,
            timeouts,
        }
    }

    /// Push `message` to the sender's and the recipient's current connections.
    ///
    /// A participant messaging themselves receives the event once.
    pub async fn dispatch(&self, message: &DirectMessage) -> DispatchReport {
        let mut targets = Vec::with_capacity(2);
        for participant_id in [&message.sender_id, &message.recipient_id] {
            if let Some(handle) = self.registry.lookup(participant_id).await
                && !targets.iter().any(|(_, h)| h == &handle)
            {
                targets.push((participant_id.clone(), handle));
            }
        }

        let mut report = DispatchReport::default();
        for (participant_id, handle) in targets {
            match handle
                .push(ServerEvent::Delivery(message.clone()), self.timeouts.send)
                .await
            {
                Ok(()) => report.delivered_to.push(participant_id),
                Err(e) => {
                    tracing::warn!(
                        "Failed to deliver message {} to '{}': {}",
                        message.id,
                        participant_id,
                        e
                    );
                    self.presence.evict(&participant_id, &handle).await;
                    report.failed.push(participant_id);
                }
            }
        }

        tracing::debug!(
            "Dispatched message {} ({} -> {}) to {} connections",
            message.id,
            message.sender_id,
            message.recipient_id,
            report.delivered_to.len()
        );

        report
    }
}

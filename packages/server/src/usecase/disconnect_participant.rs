//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - ハンドル一致時のみの deregister と offline 通知
//!
//! ### なぜこのテストが必要か
//! - 再接続直後に古い切断ハンドラが新しい接続を消してしまう競合を防ぐ
//!
//! ### どのような状況を想定しているか
//! - 正常系：切断と offline 通知
//! - エッジケース：既に置き換えられたハンドルの切断（静かに無視）

use std::sync::Arc;

use crate::domain::{CloseReason, ConnectionHandle, ConnectionRegistry, ParticipantId};

use super::{PresenceReport, PublishPresenceUseCase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The handle was current; the participant has been announced offline
    Removed(PresenceReport),
    /// A newer connection already replaced this handle (expected after a fast reconnect)
    StaleDiscarded,
}

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    presence: Arc<PublishPresenceUseCase>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        presence: Arc<PublishPresenceUseCase>,
    ) -> Self {
        Self { registry, presence }
    }

    /// 参加者切断を実行
    ///
    /// # Arguments
    ///
    /// * `participant_id` - 切断した参加者
    /// * `handle` - 切断したトランスポートのハンドル
    pub async fn execute(
        &self,
        participant_id: &ParticipantId,
        handle: &ConnectionHandle,
    ) -> DisconnectOutcome {
        handle.close(CloseReason::Disconnected);

        if !self.registry.deregister(participant_id, handle).await {
            tracing::debug!(
                "Connection {} of '{}' was already replaced; skipping offline",
                handle.id(),
                participant_id
            );
            return DisconnectOutcome::StaleDiscarded;
        }

        DisconnectOutcome::Removed(self.presence.publish(participant_id, false).await)
    }

    /// 接続中の参加者数を取得
    pub async fn count_remaining_participants(&self) -> usize {
        self.registry.count().await
    }
}

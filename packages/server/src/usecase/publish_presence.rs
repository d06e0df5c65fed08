//! UseCase: プレゼンス通知（Presence Publisher）
//!
//! ## 責務
//!
//! - 参加者の online / offline を他の全接続へブロードキャスト
//! - online フラグを永続ストアへミラー
//! - 送信に失敗したハンドルを「切断済み」とみなして掃除する（自己修復）
//!
//! ## 順序保証
//!
//! 同じ参加者についての通知は参加者単位のロックで直列化し、ロック取得後に
//! レジストリの最新状態と突き合わせます。状態が既に変わっていれば（例: offline を
//! 流す前に再接続された）その通知は破棄します。これにより参加者ごとの通知は
//! register / deregister の順序と一致します。

use std::{collections::VecDeque, sync::Arc};

use crate::domain::{
    CloseReason, ConnectionHandle, ConnectionRegistry, ParticipantId, ParticipantRepository,
    PresenceEvent, ServerEvent,
};

use super::{RelayTimeouts, bounded, keyed_lock::KeyedLock};

/// Result of one `publish` call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PresenceReport {
    /// Participants that received the subject's presence event
    pub notified: Vec<ParticipantId>,
    /// Participants whose handles failed and were deregistered along the way
    pub evicted: Vec<ParticipantId>,
    /// The registry no longer matched the requested state, so nothing was sent
    pub superseded: bool,
}

/// プレゼンス通知のユースケース
pub struct PublishPresenceUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    participants: Arc<dyn ParticipantRepository>,
    timeouts: RelayTimeouts,
    sequencer: KeyedLock<ParticipantId>,
}

impl PublishPresenceUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        participants: Arc<dyn ParticipantRepository>,
        timeouts: RelayTimeouts,
    ) -> Self {
        Self {
            registry,
            participants,
            timeouts,
            sequencer: KeyedLock::new(),
        }
    }

    /// Broadcast `{participant_id, online}` to every other registered handle and
    /// mirror the flag into the store.
    ///
    /// Handles that fail to accept the event are closed, deregistered and announced
    /// offline in turn.
    pub async fn publish(&self, participant_id: &ParticipantId, online: bool) -> PresenceReport {
        let mut report = PresenceReport::default();
        let mut pending = VecDeque::new();

        match self
            .publish_one(participant_id, online, &mut pending, &mut report.evicted)
            .await
        {
            Some(notified) => report.notified = notified,
            None => report.superseded = true,
        }

        // 掃除で発生した offline 通知（再帰せずキューで処理）
        while let Some(evicted_id) = pending.pop_front() {
            self.publish_one(&evicted_id, false, &mut pending, &mut report.evicted)
                .await;
        }

        report
    }

    /// Close a handle that failed a push and take it out of the registry.
    ///
    /// Returns `true` when the handle was still current, in which case the
    /// participant has been announced offline.
    pub async fn evict(&self, participant_id: &ParticipantId, handle: &ConnectionHandle) -> bool {
        handle.close(CloseReason::SendFailed);
        if !self.registry.deregister(participant_id, handle).await {
            return false;
        }
        let report = self.publish(participant_id, false).await;
        tracing::info!(
            "Evicted dead connection of '{}' (notified {} participants)",
            participant_id,
            report.notified.len()
        );
        true
    }

    async fn publish_one(
        &self,
        subject: &ParticipantId,
        online: bool,
        pending: &mut VecDeque<ParticipantId>,
        evicted: &mut Vec<ParticipantId>,
    ) -> Option<Vec<ParticipantId>> {
        let _guard = self.sequencer.lock(subject).await;

        let registered = self.registry.lookup(subject).await.is_some();
        if registered != online {
            tracing::debug!(
                "Skipping presence {} for '{}': superseded by a newer registry change",
                if online { "online" } else { "offline" },
                subject
            );
            return None;
        }

        self.mirror_online_flag(subject, online).await;

        let event = ServerEvent::Presence(PresenceEvent {
            participant_id: subject.clone(),
            online,
        });

        // スナップショットを取ってから送信する（送信中にレジストリのロックを保持しない）
        let targets = self.registry.snapshot().await;
        let mut notified = Vec::with_capacity(targets.len());
        for (target_id, handle) in targets {
            if &target_id == subject {
                continue;
            }
            match handle.push(event.clone(), self.timeouts.send).await {
                Ok(()) => notified.push(target_id),
                Err(e) => {
                    tracing::warn!(
                        "Failed to push presence of '{}' to '{}': {}",
                        subject,
                        target_id,
                        e
                    );
                    handle.close(CloseReason::SendFailed);
                    if self.registry.deregister(&target_id, &handle).await {
                        evicted.push(target_id.clone());
                        pending.push_back(target_id);
                    }
                }
            }
        }

        tracing::debug!(
            "Broadcasted presence {} for '{}' to {} participants",
            if online { "online" } else { "offline" },
            subject,
            notified.len()
        );

        Some(notified)
    }

    async fn mirror_online_flag(&self, subject: &ParticipantId, online: bool) {
        if let Err(e) = bounded(
            self.timeouts.store,
            self.participants.set_online(subject, online),
        )
        .await
        {
            tracing::warn!(
                "Failed to persist online={} for '{}': {}",
                online,
                subject,
                e
            );
        }
    }
}

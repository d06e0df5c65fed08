//! インメモリ ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - participant_id -> ConnectionHandle のマップを保持（1 参加者につき最大 1 ハンドル）
//! - 置き換えられた古いハンドルのクローズ
//! - 古い切断ハンドラが新しい接続を消してしまわないよう、deregister はハンドル一致時のみ削除
//!
//! ロックを保持したまま送信することはありません。送信側は `snapshot` / `lookup` で
//! ハンドルのコピーを取得してから push します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{CloseReason, ConnectionHandle, ConnectionRegistry, ParticipantId};

/// HashMap をバックエンドにした ConnectionRegistry
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    /// Key: participant_id
    /// Value: 現在有効なハンドル
    entries: Mutex<HashMap<ParticipantId, ConnectionHandle>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(
        &self,
        participant_id: ParticipantId,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let connection_id = handle.id();
        let displaced = {
            let mut entries = self.entries.lock().await;
            entries.insert(participant_id.clone(), handle)
        };

        if let Some(previous) = &displaced {
            previous.close(CloseReason::Replaced);
            tracing::info!(
                "Participant '{}' reconnected: connection {} replaced {}",
                participant_id,
                connection_id,
                previous.id()
            );
        } else {
            tracing::debug!(
                "Participant '{}' registered with connection {}",
                participant_id,
                connection_id
            );
        }

        displaced
    }

    async fn lookup(&self, participant_id: &ParticipantId) -> Option<ConnectionHandle> {
        let entries = self.entries.lock().await;
        entries.get(participant_id).cloned()
    }

    async fn deregister(&self, participant_id: &ParticipantId, handle: &ConnectionHandle) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get(participant_id) {
            Some(current) if current == handle => {
                entries.remove(participant_id);
                tracing::debug!(
                    "Participant '{}' deregistered (connection {})",
                    participant_id,
                    handle.id()
                );
                true
            }
            _ => {
                tracing::debug!(
                    "Ignoring stale deregister for '{}' (connection {})",
                    participant_id,
                    handle.id()
                );
                false
            }
        }
    }

    async fn snapshot(&self) -> Vec<(ParticipantId, ConnectionHandle)> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect()
    }

    async fn count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

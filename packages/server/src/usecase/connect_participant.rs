//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::authenticate() / execute() メソッド
//! - ハンドシェイク時の認証（資格情報なし・不正・期限切れ・タイムアウト）
//! - レジストリへの登録と online 通知
//!
//! ### なぜこのテストが必要か
//! - 認証に失敗した接続が登録されないことを保証
//! - 再接続時に古い接続が閉じられ、二重配信が起きないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加者の接続
//! - 異常系：資格情報なし、検証失敗、検証タイムアウト
//! - エッジケース：同じ参加者の再接続（last connection wins）

use std::sync::Arc;

use crate::domain::{
    AuthError, ConnectionHandle, ConnectionId, ConnectionRegistry, Credential, IdentityVerifier,
    ParticipantId,
};

use super::{PresenceReport, PublishPresenceUseCase, RelayTimeouts};

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    /// Connection that was replaced (and closed) by this one
    pub displaced: Option<ConnectionId>,
    pub presence: PresenceReport,
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// IdentityVerifier（資格情報検証の抽象化）
    verifier: Arc<dyn IdentityVerifier>,
    /// ConnectionRegistry（接続中ハンドルの管理）
    registry: Arc<dyn ConnectionRegistry>,
    /// Presence Publisher
    presence: Arc<PublishPresenceUseCase>,
    timeouts: RelayTimeouts,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        registry: Arc<dyn ConnectionRegistry>,
        presence: Arc<PublishPresenceUseCase>,
        timeouts: RelayTimeouts,
    ) -> Self {
        Self {
            verifier,
            registry,
            presence,
            timeouts,
        }
    }

    /// ハンドシェイク（または REST リクエスト）の資格情報を検証する
    ///
    /// # Arguments
    ///
    /// * `credential` - ハンドシェイクで提示された資格情報（なければ `None`）
    ///
    /// # Returns
    ///
    /// * `Ok(ParticipantId)` - 検証成功
    /// * `Err(AuthError)` - 資格情報なし・不正・期限切れ・タイムアウト
    pub async fn authenticate(
        &self,
        credential: Option<Credential>,
    ) -> Result<ParticipantId, AuthError> {
        let credential = credential.ok_or(AuthError::MissingCredential)?;

        match tokio::time::timeout(self.timeouts.verify, self.verifier.verify(&credential)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Identity verification timed out after {:?}",
                    self.timeouts.verify
                );
                Err(AuthError::Timeout)
            }
        }
    }

    /// 認証済みの接続をレジストリに登録し、online を通知する
    ///
    /// 同じ参加者の古い接続があればレジストリがクローズする。
    pub async fn execute(
        &self,
        participant_id: ParticipantId,
        handle: ConnectionHandle,
    ) -> ConnectOutcome {
        let displaced = self
            .registry
            .register(participant_id.clone(), handle)
            .await
            .map(|previous| previous.id());

        let presence = self.presence.publish(&participant_id, true).await;

        ConnectOutcome {
            displaced,
            presence,
        }
    }
}

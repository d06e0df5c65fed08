//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 永続化してから配信する順序（persist-then-dispatch）
//!
//! ### なぜこのテストが必要か
//! - 永続化に失敗したメッセージがライブ配信されないことを保証
//! - 受信者がオフラインでも送信自体は成功することを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者と受信者の両方に配信
//! - 異常系：存在しない受信者、ストアのタイムアウト
//! - エッジケース：受信者がオフライン

use std::sync::Arc;

use crate::domain::{
    DirectMessage, MessageContent, MessageRepository, NewMessage, ParticipantId,
    ParticipantRepository,
};

use super::{
    DispatchMessageUseCase, DispatchReport, RelayTimeouts, bounded, error::SendMessageError,
    keyed_lock::KeyedLock,
};

/// A persisted message together with how its live delivery went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message: DirectMessage,
    pub delivery: DispatchReport,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// ParticipantRepository（受信者の存在確認）
    participants: Arc<dyn ParticipantRepository>,
    /// MessageRepository（メッセージの永続化）
    messages: Arc<dyn MessageRepository>,
    /// Message Dispatcher
    dispatcher: Arc<DispatchMessageUseCase>,
    timeouts: RelayTimeouts,
    /// 送信者→受信者のペアごとに永続化と配信を直列化する
    pair_locks: KeyedLock<(ParticipantId, ParticipantId)>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        participants: Arc<dyn ParticipantRepository>,
        messages: Arc<dyn MessageRepository>,
        dispatcher: Arc<DispatchMessageUseCase>,
        timeouts: RelayTimeouts,
    ) -> Self {
        Self {
            participants,
            messages,
            dispatcher,
            timeouts,
            pair_locks: KeyedLock::new(),
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender_id` - 認証済みの送信者
    /// * `recipient_id` - 受信者
    /// * `content` - メッセージ本文
    ///
    /// # Returns
    ///
    /// * `Ok(SentMessage)` - 永続化されたレコードと配信結果
    /// * `Err(SendMessageError)` - 受信者が存在しない、またはストアの失敗（この場合は配信しない）
    pub async fn execute(
        &self,
        sender_id: ParticipantId,
        recipient_id: ParticipantId,
        content: MessageContent,
    ) -> Result<SentMessage, SendMessageError> {
        let recipient = bounded(
            self.timeouts.store,
            self.participants.find_participant(&recipient_id),
        )
        .await?;
        if recipient.is_none() {
            return Err(SendMessageError::RecipientNotFound(
                recipient_id.into_string(),
            ));
        }

        let _guard = self
            .pair_locks
            .lock(&(sender_id.clone(), recipient_id.clone()))
            .await;

        // 1. 永続化（失敗したら配信しない）
        let message = bounded(
            self.timeouts.store,
            self.messages.insert_message(NewMessage {
                sender_id,
                recipient_id,
                content,
            }),
        )
        .await
        .inspect_err(|e| tracing::error!("Failed to persist message: {}", e))?;

        tracing::info!(
            "Stored message {} from '{}' to '{}'",
            message.id,
            message.sender_id,
            message.recipient_id
        );

        // 2. ライブ配信（ベストエフォート）
        let delivery = self.dispatcher.dispatch(&message).await;

        Ok(SentMessage { message, delivery })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::{ConnectionRegistry, MessageId, RepositoryError, ServerEvent},
        infrastructure::{registry::InMemoryConnectionRegistry, repository::InMemoryChatRepository},
        usecase::{
            PublishPresenceUseCase,
            test_support::{
                create_test_registry, drain, fast_timeouts, open_connection, pid,
                seeded_repository,
            },
        },
    };

    struct StalledMessageRepository;

    #[async_trait]
    impl MessageRepository for StalledMessageRepository {
        async fn insert_message(
            &self,
            _message: NewMessage,
        ) -> Result<DirectMessage, RepositoryError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(RepositoryError::Backend("unreachable".to_string()))
        }

        async fn find_messages_for_pair(
            &self,
            _a: &ParticipantId,
            _b: &ParticipantId,
        ) -> Result<Vec<DirectMessage>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn find_messages_for_participant(
            &self,
            _participant_id: &ParticipantId,
        ) -> Result<Vec<DirectMessage>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn mark_read(
            &self,
            _recipient_id: &ParticipantId,
            _message_ids: &[MessageId],
        ) -> Result<usize, RepositoryError> {
            Ok(0)
        }
    }

    fn content(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    async fn create_usecase(
        messages: Option<Arc<dyn MessageRepository>>,
    ) -> (
        SendMessageUseCase,
        Arc<InMemoryConnectionRegistry>,
        Arc<InMemoryChatRepository>,
    ) {
        let registry = create_test_registry();
        let repository = seeded_repository(&["alice", "bob"]).await;
        let presence = Arc::new(PublishPresenceUseCase::new(
            registry.clone(),
            repository.clone(),
            fast_timeouts(),
        ));
        let dispatcher = Arc::new(DispatchMessageUseCase::new(
            registry.clone(),
            presence,
            fast_timeouts(),
        ));
        let messages = messages.unwrap_or_else(|| repository.clone() as Arc<dyn MessageRepository>);
        let usecase =
            SendMessageUseCase::new(repository.clone(), messages, dispatcher, fast_timeouts());
        (usecase, registry, repository)
    }

    #[tokio::test]
    async fn test_send_message_success() {
        // テスト項目: A→B の "hi" が永続化され、A と B の両方に同じレコードが届く
        // given (前提条件):
        let (usecase, registry, repository) = create_usecase(None).await;
        let (alice, mut alice_rx) = open_connection();
        let (bob, mut bob_rx) = open_connection();
        registry.register(pid("alice"), alice).await;
        registry.register(pid("bob"), bob).await;

        // when (操作):
        let sent = usecase
            .execute(pid("alice"), pid("bob"), content("hi"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(sent.message.content.as_str(), "hi");
        assert!(!sent.message.read);
        assert_eq!(sent.delivery.delivered_to, vec![pid("alice"), pid("bob")]);
        let expected = vec![ServerEvent::Delivery(sent.message.clone())];
        assert_eq!(drain(&mut alice_rx), expected);
        assert_eq!(drain(&mut bob_rx), expected);
        let stored = repository
            .find_messages_for_pair(&pid("alice"), &pid("bob"))
            .await
            .unwrap();
        assert_eq!(stored, vec![sent.message]);
    }

    #[tokio::test]
    async fn test_send_message_to_offline_recipient() {
        // テスト項目: 受信者がオフラインでも成功し、送信者にだけ届く
        // given (前提条件):
        let (usecase, registry, repository) = create_usecase(None).await;
        let (alice, mut alice_rx) = open_connection();
        registry.register(pid("alice"), alice).await;

        // when (操作):
        let sent = usecase
            .execute(pid("alice"), pid("bob"), content("see you later"))
            .await
            .unwrap();

        // then (期待する結果): メッセージは保存済みで、次回の一覧取得で回収できる
        assert_eq!(sent.delivery.delivered_to, vec![pid("alice")]);
        assert_eq!(drain(&mut alice_rx).len(), 1);
        let stored = repository
            .find_messages_for_participant(&pid("bob"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_send_message_unknown_recipient() {
        // テスト項目: 存在しない受信者へは送信できず、何も保存されない
        // given (前提条件):
        let (usecase, _registry, repository) = create_usecase(None).await;

        // when (操作):
        let result = usecase
            .execute(pid("alice"), pid("mallory"), content("hello?"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SendMessageError::RecipientNotFound("mallory".to_string()))
        );
        let stored = repository
            .find_messages_for_participant(&pid("alice"))
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_store_timeout_prevents_dispatch() {
        // テスト項目: 永続化がタイムアウトしたらエラーになり、配信は行われない
        // given (前提条件):
        let (usecase, registry, _repository) =
            create_usecase(Some(Arc::new(StalledMessageRepository))).await;
        let (alice, mut alice_rx) = open_connection();
        let (bob, mut bob_rx) = open_connection();
        registry.register(pid("alice"), alice).await;
        registry.register(pid("bob"), bob).await;

        // when (操作):
        let result = usecase
            .execute(pid("alice"), pid("bob"), content("hi"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(SendMessageError::Store(RepositoryError::Timeout)));
        assert!(drain(&mut alice_rx).is_empty());
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[tokio::test]
    async fn test_messages_per_pair_arrive_in_send_order() {
        // テスト項目: 同じペアの連続送信は保存順と同じ順序で届く
        // given (前提条件):
        let (usecase, registry, _repository) = create_usecase(None).await;
        let (bob, mut bob_rx) = open_connection();
        registry.register(pid("bob"), bob).await;

        // when (操作):
        for text in ["one", "two", "three"] {
            usecase
                .execute(pid("alice"), pid("bob"), content(text))
                .await
                .unwrap();
        }

        // then (期待する結果):
        let received: Vec<String> = drain(&mut bob_rx)
            .into_iter()
            .filter_map(|event| match event {
                ServerEvent::Delivery(m) => Some(m.content.into_string()),
                ServerEvent::Presence(_) => None,
            })
            .collect();
        assert_eq!(received, vec!["one", "two", "three"]);
    }
}

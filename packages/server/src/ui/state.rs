//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::ConnectionRegistry,
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, FetchMessagesUseCase,
        ListParticipantsUseCase, SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// FetchMessagesUseCase（メッセージ一覧取得のユースケース）
    pub fetch_messages_usecase: Arc<FetchMessagesUseCase>,
    /// ListParticipantsUseCase（参加者一覧取得のユースケース）
    pub list_participants_usecase: Arc<ListParticipantsUseCase>,
    /// 接続中のハンドル（デバッグ用エンドポイントとシャットダウン時に参照）
    pub registry: Arc<dyn ConnectionRegistry>,
    /// 接続ごとの送信キューの容量
    pub outbound_capacity: usize,
}

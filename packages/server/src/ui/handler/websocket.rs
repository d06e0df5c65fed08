//! WebSocket connection handler.

use std::{fmt::Display, sync::Arc, time::Duration};

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{
    sink::{Sink, SinkExt},
    stream::StreamExt,
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{
        CloseReason, CloseSignal, ConnectionHandle, ConnectionLifecycle, Credential,
        LifecycleError, ParticipantId, ServerEvent,
    },
    infrastructure::dto::conversion::encode_server_event,
    ui::{auth::bearer_credential, error::ApiError, state::AppState},
    usecase::DisconnectOutcome,
};

/// Close code sent to a connection that was replaced by a newer one for the same participant
pub const CLOSE_CODE_REPLACED: u16 = 4000;
/// Close code sent to a connection that missed a send deadline
pub const CLOSE_CODE_SEND_FAILED: u16 = 4001;
/// Upper bound for writing the Close frame to a peer that may have stopped reading
const CLOSE_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Alternative to the `Authorization` header for clients that cannot set headers
    pub token: Option<String>,
}

/// Authenticate the handshake and upgrade.
///
/// Authentication failures are answered with 401 before the upgrade, so nothing is registered.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let mut lifecycle = ConnectionLifecycle::new();
    lifecycle.begin_authentication()?;

    let credential = bearer_credential(&headers)
        .or_else(|| query.token.and_then(|token| Credential::new(token).ok()));

    let participant_id = match state
        .connect_participant_usecase
        .authenticate(credential)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Rejected WebSocket handshake: {}", e);
            lifecycle.closed()?;
            return Err(e.into());
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, participant_id, lifecycle)))
}

/// Close frame announcing why the server ended the connection
fn close_frame(reason: CloseReason) -> CloseFrame {
    let (code, reason) = match reason {
        CloseReason::Replaced => (CLOSE_CODE_REPLACED, "replaced"),
        CloseReason::SendFailed => (CLOSE_CODE_SEND_FAILED, "send failed"),
        CloseReason::Shutdown => (1001, "server shutting down"),
        CloseReason::Disconnected => (1000, "disconnected"),
    };
    CloseFrame {
        code,
        reason: reason.into(),
    }
}

/// Spawns a task that pumps queued events to the WebSocket.
///
/// The close signal takes priority over queued events and interrupts a write that is
/// stuck on a peer that stopped reading. Once the handle is closed, a Close frame is
/// written (bounded by `close_timeout`) and the task ends, dropping the sink.
fn pusher_loop<S>(
    mut inbound: mpsc::Receiver<ServerEvent>,
    signal: CloseSignal,
    mut sender: S,
    participant_id: ParticipantId,
    close_timeout: Duration,
) -> tokio::task::JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                reason = signal.closed() => {
                    send_close(&mut sender, reason, &participant_id, close_timeout).await;
                    break;
                }
                event = inbound.recv() => {
                    let Some(event) = event else { break };
                    let text = match encode_server_event(event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("Failed to encode event for '{}': {}", participant_id, e);
                            continue;
                        }
                    };
                    tokio::select! {
                        biased;
                        reason = signal.closed() => {
                            tracing::debug!("Write to '{}' interrupted by close", participant_id);
                            send_close(&mut sender, reason, &participant_id, close_timeout).await;
                            break;
                        }
                        result = sender.send(Message::Text(text.into())) => {
                            if let Err(e) = result {
                                tracing::warn!("Failed to write to '{}': {}", participant_id, e);
                                break;
                            }
                        }
                    }
                }
            }
        }
    })
}

async fn send_close<S>(
    sender: &mut S,
    reason: CloseReason,
    participant_id: &ParticipantId,
    close_timeout: Duration,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    tracing::debug!("Closing socket of '{}': {:?}", participant_id, reason);
    let frame = Message::Close(Some(close_frame(reason)));
    match tokio::time::timeout(close_timeout, sender.send(frame)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("Failed to send Close to '{}': {}", participant_id, e),
        Err(_) => tracing::warn!(
            "Close frame to '{}' not written within {:?}; dropping the transport",
            participant_id,
            close_timeout
        ),
    }
}

fn log_transition(participant_id: &ParticipantId, result: Result<(), LifecycleError>) {
    if let Err(e) = result {
        tracing::warn!("Connection of '{}': {}", participant_id, e);
    }
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    participant_id: ParticipantId,
    mut lifecycle: ConnectionLifecycle,
) {
    let (handle, mailbox) = ConnectionHandle::channel(state.outbound_capacity);

    let outcome = state
        .connect_participant_usecase
        .execute(participant_id.clone(), handle.clone())
        .await;
    log_transition(&participant_id, lifecycle.registered(participant_id.clone()));
    tracing::info!(
        "Participant '{}' connected (connection {}, notified {} participants)",
        participant_id,
        handle.id(),
        outcome.presence.notified.len()
    );
    if let Some(displaced) = outcome.displaced {
        tracing::info!(
            "Connection {} of '{}' was replaced by {}",
            displaced,
            participant_id,
            handle.id()
        );
    }

    let (sender, mut receiver) = socket.split();
    let (inbound, signal) = mailbox.split();

    // Spawn a task to send queued events to this client
    let mut send_task = pusher_loop(
        inbound,
        signal,
        sender,
        participant_id.clone(),
        CLOSE_WRITE_TIMEOUT,
    );

    // Spawn a task to read from this client. Inbound frames carry no commands;
    // messages are sent over HTTP.
    let participant_id_clone = participant_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Participant '{}' requested close", participant_id_clone);
                    break;
                }
                Ok(Message::Text(text)) => {
                    tracing::debug!(
                        "Ignoring text frame from '{}' ({} bytes)",
                        participant_id_clone,
                        text.len()
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", participant_id_clone, e);
                    break;
                }
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    log_transition(&participant_id, lifecycle.begin_closing());
    match state
        .disconnect_participant_usecase
        .execute(&participant_id, &handle)
        .await
    {
        DisconnectOutcome::Removed(report) => {
            let remaining = state
                .disconnect_participant_usecase
                .count_remaining_participants()
                .await;
            tracing::info!(
                "Participant '{}' disconnected (notified {} participants, {} still connected)",
                participant_id,
                report.notified.len(),
                remaining
            );
        }
        DisconnectOutcome::StaleDiscarded => tracing::debug!(
            "Replaced connection {} of '{}' finished",
            handle.id(),
            participant_id
        ),
    }
    log_transition(&participant_id, lifecycle.closed());
    tracing::debug!(
        "Connection {} of '{}' ended in state {:?}",
        handle.id(),
        participant_id,
        lifecycle.state()
    );
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        pin::Pin,
        sync::Mutex,
        task::{Context, Poll},
    };

    use super::*;
    use crate::domain::PresenceEvent;

    /// Peer that never reads: every write stays pending.
    struct StalledSink;

    impl Sink<Message> for StalledSink {
        type Error = Infallible;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<(), Infallible> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Peer that records every frame it is sent.
    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<Message>>>,
    }

    impl Sink<Message> for RecordingSink {
        type Error = Infallible;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Infallible> {
            self.frames.lock().unwrap().push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }
    }

    fn alice() -> ParticipantId {
        ParticipantId::new("alice".to_string()).unwrap()
    }

    fn bob_online() -> ServerEvent {
        ServerEvent::Presence(PresenceEvent {
            participant_id: ParticipantId::new("bob".to_string()).unwrap(),
            online: true,
        })
    }

    #[tokio::test]
    async fn test_close_interrupts_write_to_peer_that_stopped_reading() {
        // テスト項目: 読まない相手への書き込みで詰まっていても、ハンドルを閉じればタスクが終わる
        // given (前提条件):
        let (handle, mailbox) = ConnectionHandle::channel(4);
        handle
            .push(bob_online(), Duration::from_millis(10))
            .await
            .unwrap();
        let (inbound, signal) = mailbox.split();
        let task = pusher_loop(
            inbound,
            signal,
            StalledSink,
            alice(),
            Duration::from_millis(50),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        // when (操作):
        handle.close(CloseReason::SendFailed);

        // then (期待する結果):
        tokio::time::timeout(Duration::from_millis(500), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_queued_events_then_close_frame() {
        // テスト項目: キューのイベントを書き込んだ後、クローズ時には理由に応じた Close フレームを送る
        // given (前提条件):
        let (handle, mailbox) = ConnectionHandle::channel(4);
        handle
            .push(bob_online(), Duration::from_millis(10))
            .await
            .unwrap();
        let (inbound, signal) = mailbox.split();
        let sink = RecordingSink::default();
        let task = pusher_loop(
            inbound,
            signal,
            sink.clone(),
            alice(),
            Duration::from_millis(50),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;

        // when (操作):
        handle.close(CloseReason::Replaced);
        tokio::time::timeout(Duration::from_millis(500), task)
            .await
            .unwrap()
            .unwrap();

        // then (期待する結果):
        let frames = sink.frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert!(matches!(
            &frames[0],
            Message::Text(text) if text.as_str().contains("\"presence\"")
        ));
        assert!(matches!(
            &frames[1],
            Message::Close(Some(frame)) if frame.code == CLOSE_CODE_REPLACED
        ));
    }

    #[test]
    fn test_replaced_close_frame() {
        // テスト項目: 置き換えられた接続には 4000 / "replaced" を送る
        // given (前提条件):
        let reason = CloseReason::Replaced;

        // when (操作):
        let frame = close_frame(reason);

        // then (期待する結果):
        assert_eq!(frame.code, CLOSE_CODE_REPLACED);
        assert_eq!(frame.reason.as_str(), "replaced");
    }

    #[test]
    fn test_shutdown_close_frame_is_going_away() {
        // テスト項目: シャットダウン時は 1001 (going away)
        // given (前提条件):
        let reason = CloseReason::Shutdown;

        // when (操作):
        let frame = close_frame(reason);

        // then (期待する結果):
        assert_eq!(frame.code, 1001);
    }
}

//! WebSocket client session management.

use std::sync::Arc;

use denpo_server::infrastructure::dto::{
    http::ErrorResponse,
    websocket::{DeliveryEventDto, PresenceEventDto},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, client::IntoClientRequest, http::HeaderValue, protocol::Message},
};

use crate::{
    api::ApiClient, error::ClientError, formatter::MessageFormatter, inbox::Inbox,
    policy::parse_input, ui::redisplay_prompt,
};

/// Close code the server sends when another session of the same participant takes over
const CLOSE_CODE_REPLACED: u16 = 4000;

/// Run one WebSocket session until the user exits (`Ok`) or the connection ends (`Err`).
///
/// # Arguments
///
/// * `url` - WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
/// * `api` - REST client carrying the same token
/// * `inbox` - Messages seen so far, shared across sessions
/// * `input_rx` - Lines typed by the user
pub async fn run_client_session(
    url: &str,
    api: &ApiClient,
    inbox: &Arc<Mutex<Inbox>>,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    let authorization = HeaderValue::from_str(&format!("Bearer {}", api.token()))
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    request.headers_mut().insert("Authorization", authorization);

    let (ws_stream, _response) = connect_async(request).await.map_err(handshake_error)?;
    tracing::info!("Connected to relay server!");

    // Full fetch on every (re)connect: anything sent while offline shows up here
    let users = api.list_users().await?;
    let me = users
        .first()
        .map(|u| u.id.clone())
        .ok_or_else(|| ClientError::ConnectionError("empty participant list".to_string()))?;
    print!("{}", MessageFormatter::format_participants(&users, &me));

    let fetched = api.fetch_messages().await?;
    let (fresh, known) = {
        let mut inbox = inbox.lock().await;
        let fresh = inbox.merge(fetched);
        (fresh, inbox.known())
    };
    tracing::info!("Fetched {} new messages ({} known)", fresh.len(), known);
    for message in &fresh {
        print!("{}", MessageFormatter::format_message(message, &me));
    }
    println!(
        "\nYou are '{}'. Type '@<recipient> <message>' and press Enter to send. Press Ctrl+D to exit.\n",
        me
    );
    redisplay_prompt();

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to handle incoming events
    let inbox_for_read = inbox.clone();
    let me_for_read = me.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Ok(presence) = serde_json::from_str::<PresenceEventDto>(&text) {
                        print!(
                            "{}",
                            MessageFormatter::format_presence(
                                &presence.participant_id,
                                presence.online
                            )
                        );
                    } else if let Ok(delivery) = serde_json::from_str::<DeliveryEventDto>(&text) {
                        let message = delivery.message;
                        // Already shown via the full fetch or our own send
                        if !inbox_for_read.lock().await.accept(message.clone()) {
                            continue;
                        }
                        print!("{}", MessageFormatter::format_message(&message, &me_for_read));
                    } else {
                        print!("{}", MessageFormatter::format_raw_message(&text));
                    }
                    redisplay_prompt();
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!("Server closed the connection: {:?}", frame);
                    return match frame {
                        Some(frame) if u16::from(frame.code) == CLOSE_CODE_REPLACED => {
                            Err(ClientError::Replaced)
                        }
                        _ => Err(ClientError::ConnectionLost(
                            "server closed the connection".to_string(),
                        )),
                    };
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionLost(e.to_string()));
                }
                _ => {}
            }
        }
        Err(ClientError::ConnectionLost("stream ended".to_string()))
    });

    loop {
        tokio::select! {
            result = &mut read_task => {
                return result.unwrap_or_else(|e| Err(ClientError::ConnectionLost(e.to_string())));
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // User exit (Ctrl+C / Ctrl+D)
                    let _ = write.send(Message::Close(None)).await;
                    read_task.abort();
                    return Ok(());
                };
                if let Err(e) = handle_input(api, inbox, &line).await {
                    if matches!(e, ClientError::Unauthorized(_)) {
                        read_task.abort();
                        return Err(e);
                    }
                    println!("{}", e);
                }
                redisplay_prompt();
            }
        }
    }
}

/// Send one typed line over `POST /api/messages`
async fn handle_input(
    api: &ApiClient,
    inbox: &Arc<Mutex<Inbox>>,
    line: &str,
) -> Result<(), ClientError> {
    let outgoing = parse_input(line)?;
    let stored = api
        .send_message(&outgoing.recipient_id, &outgoing.content)
        .await?;
    print!("{}", MessageFormatter::format_sent_confirmation(&stored));
    // The live echo of our own message is then dropped as a duplicate
    inbox.lock().await.accept(stored);
    Ok(())
}

/// Turn a failed handshake into a client error; 401 is never retried
fn handshake_error(error: tungstenite::Error) -> ClientError {
    match error {
        tungstenite::Error::Http(response) if response.status().as_u16() == 401 => {
            ClientError::Unauthorized(rejection_message(response.body().as_deref()))
        }
        other => ClientError::ConnectionError(other.to_string()),
    }
}

/// Reason carried in the `{ "error": ... }` body of a rejected handshake
fn rejection_message(body: Option<&[u8]>) -> String {
    body.and_then(|body| serde_json::from_slice::<ErrorResponse>(body).ok())
        .map(|body| body.error)
        .unwrap_or_else(|| "Authentication error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_from_error_body() {
        // テスト項目: 401 の本文から拒否理由が取り出せる
        // given (前提条件):
        let body = br#"{"error":"Authentication error: Token expired"}"#;

        // when (操作):
        let message = rejection_message(Some(&body[..]));

        // then (期待する結果):
        assert_eq!(message, "Authentication error: Token expired");
    }

    #[test]
    fn test_rejection_message_without_body() {
        // テスト項目: 本文がない・解析できない場合は汎用メッセージ
        // given (前提条件):
        let garbage: &[u8] = b"<html>401</html>";

        // when (操作):
        let results = (rejection_message(None), rejection_message(Some(garbage)));

        // then (期待する結果):
        assert_eq!(results.0, "Authentication error");
        assert_eq!(results.1, "Authentication error");
    }
}

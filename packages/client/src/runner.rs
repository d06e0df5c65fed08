//! Client execution logic with reconnection support.

use std::{sync::Arc, time::Duration};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{Mutex, mpsc};

use crate::{
    api::ApiClient,
    error::ClientError,
    inbox::Inbox,
    policy::{MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL_MS, should_attempt_reconnect},
    session::run_client_session,
    ui::PROMPT,
};

/// Run the client with reconnection logic
///
/// # Arguments
///
/// * `url` - WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
/// * `api_url` - REST base URL, e.g. `http://127.0.0.1:8080`
/// * `token` - Bearer token issued for the participant
pub async fn run_client(
    url: String,
    api_url: String,
    token: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = ApiClient::new(api_url, token);
    let inbox = Arc::new(Mutex::new(Inbox::new()));
    let mut input_rx = spawn_input_reader();
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            url,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&url, &api, &inbox, &mut input_rx).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                // If the user exited, don't reconnect
                break;
            }
            Err(e) => {
                // An established session was lost: the attempt budget starts over
                if matches!(e, ClientError::ConnectionLost(_)) {
                    reconnect_count = 0;
                }

                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!("Giving up: {}", e);
                    return Err(Box::new(e));
                }

                tracing::warn!("{}", e);
                reconnect_count += 1;
                tracing::info!(
                    "Reconnecting in {} ms... (attempt {}/{})",
                    RECONNECT_INTERVAL_MS,
                    reconnect_count,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_millis(RECONNECT_INTERVAL_MS)).await;
            }
        }
    }

    Ok(())
}

/// Spawn a blocking thread for rustyline (synchronous readline).
///
/// The thread outlives individual sessions, so typed lines survive a reconnect.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

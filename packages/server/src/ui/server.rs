//! Server execution logic.

use std::{error::Error, future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    domain::{CloseReason, ConnectionRegistry},
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, FetchMessagesUseCase,
        ListParticipantsUseCase, SendMessageUseCase,
    },
};

use super::{
    handler::{
        debug_connections, get_messages, get_users, health_check, post_message, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Direct-message relay server
///
/// This struct encapsulates the wiring of the usecases and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_participant_usecase,
///     disconnect_participant_usecase,
///     send_message_usecase,
///     fetch_messages_usecase,
///     list_participants_usecase,
///     registry,
///     64,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `connect_participant_usecase` - UseCase for authentication and registration
    /// * `disconnect_participant_usecase` - UseCase for participant disconnection
    /// * `send_message_usecase` - UseCase for message sending
    /// * `fetch_messages_usecase` - UseCase for message listing
    /// * `list_participants_usecase` - UseCase for participant listing
    /// * `registry` - Connection registry shared with the usecases
    /// * `outbound_capacity` - Queue capacity of each connection handle
    pub fn new(
        connect_participant_usecase: Arc<ConnectParticipantUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        fetch_messages_usecase: Arc<FetchMessagesUseCase>,
        list_participants_usecase: Arc<ListParticipantsUseCase>,
        registry: Arc<dyn ConnectionRegistry>,
        outbound_capacity: usize,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                connect_participant_usecase,
                disconnect_participant_usecase,
                send_message_usecase,
                fetch_messages_usecase,
                list_participants_usecase,
                registry,
                outbound_capacity,
            }),
        }
    }

    /// Build the router with every endpoint
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/debug/connections", get(debug_connections))
            .route("/api/health", get(health_check))
            .route("/api/users", get(get_users))
            .route("/api/messages", get(get_messages).post(post_message))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the relay server until Ctrl+C / SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn Error + Send + Sync>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// Live connections are closed with a "going away" frame once shutdown begins.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Relay server listening on {}", listener.local_addr()?);

        let app = self.router();
        let registry = self.state.registry.clone();
        let shutdown = async move {
            shutdown.await;
            let connections = registry.snapshot().await;
            tracing::info!("Closing {} live connections", connections.len());
            for (_, handle) in connections {
                handle.close(CloseReason::Shutdown);
            }
        };

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

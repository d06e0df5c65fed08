//! Connection handle: the registry's view of one live endpoint.
//!
//! ## 設計ノート
//!
//! ハンドルは「送信キュー（bounded mpsc）」と「クローズ信号」だけを持ちます。
//! WebSocket そのものは UI 層のタスクが排他的に所有し、`ConnectionMailbox` からイベントを取り出して書き込みます。
//! これによりレジストリの操作とネットワーク I/O が分離されます。

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio_util::sync::CancellationToken;

use super::{entity::ServerEvent, error::PushError, value_object::ConnectionId};

/// Why a handle was closed by the server side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A newer connection for the same participant took over the registry entry
    Replaced,
    /// A push failed or missed its deadline; the endpoint is treated as dead
    SendFailed,
    /// The transport ended on its own
    Disconnected,
    /// The server is shutting down
    Shutdown,
}

/// Cloneable handle held by the connection registry.
///
/// Two handles are equal iff they refer to the same accepted transport.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<ServerEvent>,
    signal: CloseSignal,
}

/// Receiving side owned by the connection's own task.
#[derive(Debug)]
pub struct ConnectionMailbox {
    inbound: mpsc::Receiver<ServerEvent>,
    signal: CloseSignal,
}

/// Close notification shared between a handle and its mailbox.
#[derive(Debug, Clone)]
pub struct CloseSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<CloseReason>>,
}

impl ConnectionHandle {
    /// Create a handle with an outbound queue of `capacity` events.
    pub fn channel(capacity: usize) -> (ConnectionHandle, ConnectionMailbox) {
        let (outbound, inbound) = mpsc::channel(capacity.max(1));
        let signal = CloseSignal {
            token: CancellationToken::new(),
            reason: Arc::new(OnceLock::new()),
        };
        let handle = ConnectionHandle {
            id: ConnectionId::generate(),
            outbound,
            signal: signal.clone(),
        };
        (handle, ConnectionMailbox { inbound, signal })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event for the endpoint, waiting at most `deadline` for queue space.
    pub async fn push(&self, event: ServerEvent, deadline: Duration) -> Result<(), PushError> {
        if self.signal.is_closed() {
            return Err(PushError::Closed);
        }
        match self.outbound.send_timeout(event, deadline).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(PushError::DeadlineExceeded),
            Err(SendTimeoutError::Closed(_)) => Err(PushError::Closed),
        }
    }

    /// Idempotent. The first reason wins.
    pub fn close(&self, reason: CloseReason) {
        let _ = self.signal.reason.set(reason);
        self.signal.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.signal.is_closed() || self.outbound.is_closed()
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.signal.reason()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl ConnectionMailbox {
    /// Split into the event receiver and the close signal so both can be awaited together.
    pub fn split(self) -> (mpsc::Receiver<ServerEvent>, CloseSignal) {
        (self.inbound, self.signal)
    }
}

impl CloseSignal {
    /// Resolves once the handle has been closed.
    pub async fn closed(&self) -> CloseReason {
        self.token.cancelled().await;
        self.reason().unwrap_or(CloseReason::Disconnected)
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<CloseReason> {
        self.reason.get().copied()
    }
}

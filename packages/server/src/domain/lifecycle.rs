//! Per-connection lifecycle state machine.
//!
//! ```text
//! Connecting -> Authenticating -> Registered -> Closing -> Closed
//!                     |                                     ^
//!                     +------------- (auth failure) --------+
//! any state ----------------------- (transport error) ------+
//! ```

use super::{error::LifecycleError, value_object::ParticipantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticating,
    Registered,
    Closing,
    Closed,
}

impl ConnectionState {
    fn can_advance_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Connecting, Authenticating) => true,
            (Authenticating, Registered) => true,
            (Registered, Closing) => true,
            _ => false,
        }
    }
}

/// Tracks one connection attempt from accept to close.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    state: ConnectionState,
    participant_id: Option<ParticipantId>,
}

impl ConnectionLifecycle {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Connecting,
            participant_id: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn begin_authentication(&mut self) -> Result<(), LifecycleError> {
        self.advance(ConnectionState::Authenticating)
    }

    pub fn registered(&mut self, participant_id: ParticipantId) -> Result<(), LifecycleError> {
        self.advance(ConnectionState::Registered)?;
        self.participant_id = Some(participant_id);
        Ok(())
    }

    pub fn begin_closing(&mut self) -> Result<(), LifecycleError> {
        self.advance(ConnectionState::Closing)
    }

    /// Reachable from every state except `Closed` itself.
    pub fn closed(&mut self) -> Result<(), LifecycleError> {
        self.advance(ConnectionState::Closed)
    }

    fn advance(&mut self, next: ConnectionState) -> Result<(), LifecycleError> {
        if !self.state.can_advance_to(next) {
            return Err(LifecycleError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!(
            "Connection state {:?} -> {:?} (participant: {:?})",
            self.state,
            next,
            self.participant_id.as_ref().map(|id| id.as_str())
        );
        self.state = next;
        Ok(())
    }
}

impl Default for ConnectionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

//! Connection registry trait.

use async_trait::async_trait;

use super::{connection::ConnectionHandle, value_object::ParticipantId};

/// In-memory mapping from participant to at most one live connection handle.
///
/// Every operation is atomic with respect to the others, and none of them
/// performs network I/O.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Register `handle` for `participant_id` ("last connection wins").
    ///
    /// The displaced handle, if any, is closed before being returned.
    async fn register(
        &self,
        participant_id: ParticipantId,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle>;

    async fn lookup(&self, participant_id: &ParticipantId) -> Option<ConnectionHandle>;

    /// Remove the entry only if it still holds exactly `handle`.
    ///
    /// Returns `false` when a newer handle has already replaced it.
    async fn deregister(&self, participant_id: &ParticipantId, handle: &ConnectionHandle) -> bool;

    /// Copy of every current entry, so callers can iterate without holding the lock.
    async fn snapshot(&self) -> Vec<(ParticipantId, ConnectionHandle)>;

    async fn count(&self) -> usize;
}

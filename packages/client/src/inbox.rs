//! Local message store with id-based deduplication.
//!
//! The same message can reach the client twice: once as a live delivery event and once
//! in the full fetch after a reconnect (or as the response to its own send).
//! The inbox keeps exactly one copy per message id.

use std::collections::HashSet;

use denpo_server::infrastructure::dto::http::MessageDto;

#[derive(Debug, Default)]
pub struct Inbox {
    seen: HashSet<String>,
    messages: Vec<MessageDto>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `message` unless its id was already seen.
    ///
    /// Returns `true` when the message is new.
    pub fn accept(&mut self, message: MessageDto) -> bool {
        if !self.seen.insert(message.id.clone()) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Merge a full fetch, returning the messages that were not known yet (in fetch order).
    pub fn merge(&mut self, fetched: Vec<MessageDto>) -> Vec<MessageDto> {
        fetched
            .into_iter()
            .filter(|message| self.accept(message.clone()))
            .collect()
    }

    /// Number of distinct messages seen so far
    pub fn known(&self) -> usize {
        self.messages.len()
    }
}

//! Terminal client for the Denpo relay.
//!
//! Live events arrive over WebSocket; messages are sent and listed over HTTP.
//! After every (re)connect the client performs a full fetch and merges it with
//! live deliveries, deduplicated by message id.

pub mod api;
pub mod error;
pub mod formatter;
pub mod inbox;
pub mod policy;
pub mod runner;
pub mod session;
mod ui;

pub use runner::run_client;

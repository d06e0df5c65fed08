//! HTTP / WebSocket surface of the relay.

mod auth;
mod error;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ApiError;
pub use server::Server;

//! Request handlers.

mod http;
mod websocket;

pub use http::{debug_connections, get_messages, get_users, health_check, post_message};
pub use websocket::websocket_handler;

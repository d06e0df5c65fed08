//! Utilities shared by the Denpo server and client.

pub mod logger;
pub mod time;

//! Data Transfer Objects (DTOs) for the relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: server → client event DTOs
//! - `http`: REST request / response DTOs
//!
//! Field names are camelCase on the wire.

pub mod conversion;
pub mod http;
pub mod websocket;

//! Denpo relay server.
//!
//! Layers:
//! - `domain`: value objects, entities, connection handles and the traits the usecases depend on
//! - `usecase`: connect / disconnect, presence publishing, message dispatch and the REST operations
//! - `infrastructure`: in-memory registry and store, JWT verifier, DTOs
//! - `ui`: axum router (WebSocket + HTTP)

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

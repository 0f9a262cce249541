//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace)
//!     → GET /health        → health.rs
//!     → GET /wss/websocket → WebSocket upgrade → protocol engine
//! ```

pub mod health;
pub mod server;

pub use server::{HttpServer, HEALTH_PATH, PROTOCOL_PATH};

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! configured address
//!     → listener.rs (normalize, bind)
//!     → Hand off to HTTP layer
//!
//! WebSocket upgrade
//!     → connection.rs (session id, open-session count)
//!     → Hand off to protocol engine
//! ```

pub mod connection;
pub mod listener;

//! STOMP over WebSocket server bootstrap.
//!
//! Resolves configuration from flags and environment, installs logging,
//! applies a soft memory ceiling, optionally attaches a Redis data source,
//! runs a caller hook, then serves `/health` and the protocol endpoint.
//!
//! ```no_run
//! use stomper_server::{default_setup, PreSetup, RelayEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let hook: PreSetup = Box::new(|server| {
//!         server.set_compression(false);
//!         Ok(())
//!     });
//!     if let Err(e) = default_setup(RelayEngine::default(), Some(hook)).await {
//!         eprintln!("{e}");
//!     }
//! }
//! ```

pub mod config;
pub mod datasource;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::{default_setup, start, PreSetup, RunningServer, Shutdown, StartupError};
pub use server::{ProtocolEngine, ReadyServer, RelayEngine, StompServer};

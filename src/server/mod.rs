//! Server handle and protocol engines.
//!
//! # Data Flow
//! ```text
//! bootstrap
//!     → handle.rs (StompServer: configure, attach data source, hook)
//!     → handle.rs (setup → ReadyServer)
//!     → engine.rs (ProtocolEngine::setup, then serve per socket)
//!     → relay.rs (default engine)
//! ```

pub mod engine;
pub mod handle;
pub mod relay;

pub use engine::{EngineContext, EngineError, ProtocolEngine, Session};
pub use handle::{ReadyServer, StompServer, VERSION};
pub use relay::RelayEngine;

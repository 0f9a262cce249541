//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Logging → Memory ceiling → Server handle
//!     → Data source → Pre-setup hook → Finalize → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → HTTP server drains → memory watch stops → exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Memory (memory.rs):
//!     Ceiling recorded once → periodic resident-size sampling
//! ```

pub mod memory;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{default_setup, prepare, start, BoxError, PreSetup, RunningServer, StartupError};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (cli.rs)        environment (loader.rs)
//!     → Flags                      → EnvSource lookups
//!             \                  /
//!              ServerConfig::resolve (flag > env > default)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → handed by value to the bootstrap
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup and never reloaded
//! - Environment access goes through `EnvSource` so resolution is testable
//! - Unparseable values are structured errors, reported before any side effect

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Flags;
pub use loader::{env_int, env_string, ConfigError, EnvSource, ProcessEnv};
pub use schema::{DataSourceKind, ServerConfig};
pub use validation::ValidationError;

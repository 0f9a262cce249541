//! Data-source subsystem.
//!
//! # Data Flow
//! ```text
//! protocol engine
//!     → DataSource::publish(channel, payload)
//!     → backend (redis_source.rs: Redis PUBLISH, memory.rs: broadcast channel)
//!     → every DataSource::subscribe(channel) stream
//!     → protocol engine → sockets
//! ```
//!
//! # Design Decisions
//! - Object-safe trait so the server handle can hold `Arc<dyn DataSource>`
//! - Payloads are opaque bytes; framing belongs to the engine

use axum::body::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

pub mod memory;
pub mod redis_source;

pub use memory::MemoryDataSource;
pub use redis_source::RedisDataSource;

/// Stream of payloads published on a channel.
pub type PayloadStream = BoxStream<'static, Bytes>;

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("redis: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Pub/sub backend supplying fan-out to the protocol engine.
pub trait DataSource: Send + Sync + 'static {
    /// Short backend name for logs.
    fn kind(&self) -> &'static str;

    /// Publish a payload to every subscriber of `channel`.
    fn publish<'a>(
        &'a self,
        channel: &'a str,
        payload: Bytes,
    ) -> BoxFuture<'a, Result<(), DataSourceError>>;

    /// Subscribe to `channel`. Payloads published before this resolves are not seen.
    fn subscribe<'a>(
        &'a self,
        channel: &'a str,
    ) -> BoxFuture<'a, Result<PayloadStream, DataSourceError>>;
}

//! Protocol engine seam.
//!
//! The engine owns everything that happens on the protocol endpoint after
//! the WebSocket upgrade: frame parsing, subscriptions, broker semantics.
//! The bootstrap only configures it and hands it sockets.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocket;
use futures_util::future::BoxFuture;

use crate::datasource::{DataSource, DataSourceError};
use crate::net::connection::{ConnectionGuard, ConnectionId};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

/// Server-wide settings handed to the engine at setup.
#[derive(Clone)]
pub struct EngineContext {
    pub compression: bool,
    pub data_source: Option<Arc<dyn DataSource>>,
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("compression", &self.compression)
            .field("data_source", &self.data_source.as_ref().map(|ds| ds.kind()))
            .finish()
    }
}

/// One upgraded WebSocket connection.
#[derive(Debug)]
pub struct Session {
    pub peer: SocketAddr,
    pub compression: bool,
    guard: ConnectionGuard,
}

impl Session {
    pub(crate) fn new(peer: SocketAddr, compression: bool, guard: ConnectionGuard) -> Self {
        Self {
            peer,
            compression,
            guard,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.guard.id()
    }
}

/// A protocol implementation driving upgraded sockets.
pub trait ProtocolEngine: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Called once when the server handle is finalized.
    fn setup(&mut self, context: &EngineContext) -> Result<(), EngineError>;

    /// Drive one socket until it closes. The session is dropped when this resolves.
    fn serve(self: Arc<Self>, socket: WebSocket, session: Session) -> BoxFuture<'static, ()>;
}

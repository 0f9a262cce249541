//! The server handle configured during bootstrap.
//!
//! # Lifecycle
//! ```text
//! StompServer::new(engine, compression)
//!     → attach_data_source (optional)
//!     → pre-setup hook (optional, may mutate)
//!     → setup() consumes the handle
//!     → ReadyServer (immutable, cheap to clone, serves traffic)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::response::Response;
use tracing::{Instrument, Span};

use crate::datasource::DataSource;
use crate::net::connection::ConnectionTracker;
use crate::server::engine::{EngineContext, EngineError, ProtocolEngine, Session};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mutable server handle, only alive during the bootstrap window.
pub struct StompServer {
    span: Span,
    compression: bool,
    data_source: Option<Arc<dyn DataSource>>,
    engine: Box<dyn ProtocolEngine>,
}

impl StompServer {
    /// Handle for `engine` inside a `stomper` logging span.
    pub fn new(engine: impl ProtocolEngine, compression: bool) -> Self {
        Self::with_span(
            Box::new(engine),
            compression,
            tracing::info_span!("stomper", version = VERSION),
        )
    }

    /// Build with an explicit logging span instead of the default `stomper` span.
    pub fn with_span(engine: Box<dyn ProtocolEngine>, compression: bool, span: Span) -> Self {
        Self {
            span,
            compression,
            data_source: None,
            engine,
        }
    }

    pub fn compression(&self) -> bool {
        self.compression
    }

    pub fn set_compression(&mut self, compression: bool) {
        self.compression = compression;
    }

    /// Attach the backend engines publish to. Replaces any earlier one.
    pub fn attach_data_source(&mut self, data_source: Arc<dyn DataSource>) {
        tracing::info!(parent: &self.span, kind = data_source.kind(), "Data source attached");
        self.data_source = Some(data_source);
    }

    pub fn data_source(&self) -> Option<&Arc<dyn DataSource>> {
        self.data_source.as_ref()
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Finalize the handle. Runs the engine's own setup.
    pub fn setup(mut self) -> Result<ReadyServer, EngineError> {
        let context = EngineContext {
            compression: self.compression,
            data_source: self.data_source.clone(),
        };
        self.engine.setup(&context)?;

        tracing::debug!(parent: &self.span, engine = self.engine.name(), ?context, "Engine ready");

        Ok(ReadyServer {
            inner: Arc::new(ReadyInner {
                span: self.span,
                context,
                engine: Arc::from(self.engine),
                tracker: ConnectionTracker::new(),
            }),
        })
    }
}

impl std::fmt::Debug for StompServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StompServer")
            .field("engine", &self.engine.name())
            .field("compression", &self.compression)
            .field("data_source", &self.data_source.as_ref().map(|ds| ds.kind()))
            .finish()
    }
}

struct ReadyInner {
    span: Span,
    context: EngineContext,
    engine: Arc<dyn ProtocolEngine>,
    tracker: ConnectionTracker,
}

/// Finalized server, shared by the HTTP handlers.
#[derive(Clone)]
pub struct ReadyServer {
    inner: Arc<ReadyInner>,
}

impl ReadyServer {
    pub fn context(&self) -> &EngineContext {
        &self.inner.context
    }

    pub fn engine_name(&self) -> &'static str {
        self.inner.engine.name()
    }

    /// Sessions currently open.
    pub fn active_sessions(&self) -> u64 {
        self.inner.tracker.active_count()
    }

    /// Complete a WebSocket upgrade and hand the socket to the engine.
    pub fn upgrade(&self, ws: WebSocketUpgrade, peer: SocketAddr) -> Response {
        let engine = Arc::clone(&self.inner.engine);
        let span = self.inner.span.clone();
        let session = Session::new(peer, self.inner.context.compression, self.inner.tracker.track());

        ws.on_failed_upgrade(move |err| {
            tracing::warn!(peer = %peer, error = %err, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| {
            let session_span = tracing::info_span!(
                parent: &span,
                "session",
                session_id = %session.id(),
                peer = %session.peer,
                compression = session.compression
            );
            async move {
                tracing::debug!("Session opened");
                engine.serve(socket, session).await;
            }
            .instrument(session_span)
        })
    }
}

impl std::fmt::Debug for ReadyServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyServer")
            .field("engine", &self.inner.engine.name())
            .field("context", &self.inner.context)
            .field("active_sessions", &self.active_sessions())
            .finish()
    }
}

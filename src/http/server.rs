//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health and protocol routes
//! - Wire up middleware (tracing, request ID)
//! - Serve on a bound listener until shutdown

use std::net::SocketAddr;

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::health::health_handler;
use crate::lifecycle::Shutdown;
use crate::server::ReadyServer;

pub const HEALTH_PATH: &str = "/health";
pub const PROTOCOL_PATH: &str = "/wss/websocket";

/// HTTP server exposing the finalized server handle.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(server: ReadyServer) -> Self {
        Self {
            router: Self::build_router(server),
        }
    }

    fn build_router(server: ReadyServer) -> Router {
        Router::new()
            .route(HEALTH_PATH, get(health_handler))
            .route(PROTOCOL_PATH, get(protocol_handler))
            .with_state(server)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for serving through something other than `run`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Protocol endpoint; everything past the upgrade belongs to the engine.
async fn protocol_handler(
    State(server): State<ReadyServer>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    server.upgrade(ws, peer)
}

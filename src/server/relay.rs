//! Frame relay engine.
//!
//! # Data Flow
//! ```text
//! Client A ── frame ──→ relay ── publish(hub) ──→ DataSource
//!                                                     │
//! Client A, B, ... ←── frame ←── relay ←── subscribe(hub)
//! ```
//!
//! # Design Decisions
//! - Frames are relayed verbatim; no protocol parsing happens here
//! - Every session, including the sender, receives every frame
//! - Falls back to an in-process hub when no data source is attached
//! - Read and forward halves run in one task; either ending closes the session

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};

use crate::datasource::{DataSource, MemoryDataSource};
use crate::observability::metrics;
use crate::server::engine::{EngineContext, EngineError, ProtocolEngine, Session};

/// Channel every session publishes to and subscribes on.
pub const DEFAULT_HUB_CHANNEL: &str = "stomper";

/// Default engine: relays every frame to every open session.
pub struct RelayEngine {
    channel: String,
    hub: Option<Arc<dyn DataSource>>,
}

impl RelayEngine {
    /// Engine relaying over `channel` of the data source.
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            hub: None,
        }
    }

    /// Hub channel name.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl Default for RelayEngine {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CHANNEL)
    }
}

impl ProtocolEngine for RelayEngine {
    fn name(&self) -> &'static str {
        "relay"
    }

    fn setup(&mut self, context: &EngineContext) -> Result<(), EngineError> {
        if self.channel.is_empty() {
            return Err(EngineError::Setup("relay channel must not be empty".into()));
        }

        let hub = match &context.data_source {
            Some(ds) => Arc::clone(ds),
            None => Arc::new(MemoryDataSource::new()) as Arc<dyn DataSource>,
        };
        tracing::info!(channel = %self.channel, hub = hub.kind(), "Relay engine configured");
        self.hub = Some(hub);
        Ok(())
    }

    fn serve(self: Arc<Self>, socket: WebSocket, session: Session) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let Some(hub) = self.hub.clone() else {
                tracing::error!("Relay engine used before setup, closing session");
                return;
            };

            let mut inbound = match hub.subscribe(&self.channel).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to subscribe to hub");
                    return;
                }
            };

            let (mut sink, mut stream) = socket.split();

            let forward = async {
                while let Some(payload) = inbound.next().await {
                    if sink.send(into_message(payload)).await.is_err() {
                        break;
                    }
                }
            };

            let receive = async {
                while let Some(frame) = stream.next().await {
                    let payload = match frame {
                        Ok(Message::Text(text)) => Bytes::copy_from_slice(text.as_str().as_bytes()),
                        Ok(Message::Binary(data)) => data,
                        Ok(Message::Close(_)) => break,
                        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                        Err(e) => {
                            tracing::debug!(error = %e, "Socket read failed");
                            break;
                        }
                    };

                    match hub.publish(&self.channel, payload).await {
                        Ok(()) => metrics::record_frame_relayed(),
                        Err(e) => tracing::warn!(error = %e, "Failed to publish frame"),
                    }
                }
            };

            tokio::select! {
                _ = forward => tracing::debug!("Hub stream ended"),
                _ = receive => tracing::debug!("Client stream ended"),
            }

            // Completes the close handshake: flushes the reply queued for a
            // client close, or sends our own close frame.
            if let Err(e) = sink.close().await {
                tracing::debug!(error = %e, "Close handshake failed");
            }

            tracing::debug!(session_id = %session.id(), "Relay session finished");
        })
    }
}

/// UTF-8 payloads go out as text frames, anything else as binary.
fn into_message(payload: Bytes) -> Message {
    match std::str::from_utf8(&payload) {
        Ok(text) => Message::Text(text.to_owned().into()),
        Err(_) => Message::Binary(payload),
    }
}

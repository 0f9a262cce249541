//! In-process data source.
//!
//! Fans payloads out inside one process through per-channel broadcast senders.
//! Used by the relay engine when no external backend is attached. A channel
//! exists only while it has subscribers.

use std::sync::Arc;

use axum::body::Bytes;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::datasource::{DataSource, DataSourceError, PayloadStream};

/// Per-subscriber buffer before a slow subscriber starts losing payloads.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct MemoryDataSource {
    channels: Arc<DashMap<String, broadcast::Sender<Bytes>>>,
    capacity: usize,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe while holding the entry lock so a concurrent release cannot
    /// drop the sender in between.
    fn receiver(&self, channel: &str) -> broadcast::Receiver<Bytes> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of channels with at least one subscriber.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of live subscribers on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for MemoryDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSource for MemoryDataSource {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn publish<'a>(
        &'a self,
        channel: &'a str,
        payload: Bytes,
    ) -> BoxFuture<'a, Result<(), DataSourceError>> {
        Box::pin(async move {
            // No subscribers is not an error.
            if let Some(tx) = self.channels.get(channel) {
                let _ = tx.send(payload);
            }
            Ok(())
        })
    }

    fn subscribe<'a>(
        &'a self,
        channel: &'a str,
    ) -> BoxFuture<'a, Result<PayloadStream, DataSourceError>> {
        Box::pin(async move {
            let subscription = Subscription {
                rx: Some(self.receiver(channel)),
                channels: Arc::clone(&self.channels),
                channel: channel.to_string(),
            };

            let payloads = stream::unfold(subscription, |mut subscription| async move {
                let payload = subscription.next_payload().await?;
                Some((payload, subscription))
            });

            Ok(Box::pin(payloads) as PayloadStream)
        })
    }
}

/// One subscriber's receiver. Dropping the last subscription of a channel
/// removes the channel.
struct Subscription {
    rx: Option<broadcast::Receiver<Bytes>>,
    channels: Arc<DashMap<String, broadcast::Sender<Bytes>>>,
    channel: String,
}

impl Subscription {
    async fn next_payload(&mut self) -> Option<Bytes> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(payload) => return Some(payload),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %self.channel, skipped, "Subscriber lagged, payloads dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Release the receiver first so it is not counted below.
        drop(self.rx.take());
        self.channels
            .remove_if(&self.channel, |_, tx| tx.receiver_count() == 0);
    }
}

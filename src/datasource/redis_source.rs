//! Redis-backed data source.
//!
//! # Design Decisions
//! - One `ConnectionManager` (auto-reconnecting) shared by all publishers
//! - A dedicated pub/sub connection per subscription, closed when the stream drops

use axum::body::Bytes;
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::datasource::{DataSource, DataSourceError, PayloadStream};

#[derive(Clone)]
pub struct RedisDataSource {
    client: Client,
    manager: ConnectionManager,
}

impl RedisDataSource {
    /// Open a client for `url` and establish the shared connection.
    pub async fn connect(url: &str) -> Result<Self, DataSourceError> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client.clone()).await?;
        tracing::info!(url = %redact(url), "Connected to redis");
        Ok(Self { client, manager })
    }
}

impl std::fmt::Debug for RedisDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDataSource").finish_non_exhaustive()
    }
}

impl DataSource for RedisDataSource {
    fn kind(&self) -> &'static str {
        "redis"
    }

    fn publish<'a>(
        &'a self,
        channel: &'a str,
        payload: Bytes,
    ) -> BoxFuture<'a, Result<(), DataSourceError>> {
        Box::pin(async move {
            let mut conn = self.manager.clone();
            conn.publish::<_, _, ()>(channel, payload.to_vec()).await?;
            Ok(())
        })
    }

    fn subscribe<'a>(
        &'a self,
        channel: &'a str,
    ) -> BoxFuture<'a, Result<PayloadStream, DataSourceError>> {
        Box::pin(async move {
            let mut pubsub = self.client.get_async_pubsub().await?;
            pubsub.subscribe(channel).await?;
            let payloads = pubsub
                .into_on_message()
                .map(|msg| Bytes::copy_from_slice(msg.get_payload_bytes()));
            Ok(Box::pin(payloads) as PayloadStream)
        })
    }
}

/// Strip credentials before logging a connection URL.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_credentials() {
        assert_eq!(redact("redis://user:pw@cache:6379/0"), "redis://***@cache:6379/0");
        assert_eq!(redact("redis://cache:6379"), "redis://cache:6379");
    }

    #[tokio::test]
    async fn rejects_unparseable_url() {
        let err = RedisDataSource::connect("not a url").await.unwrap_err();
        assert!(matches!(err, DataSourceError::Redis(_)));
    }
}

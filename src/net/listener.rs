//! TCP listener binding.
//!
//! # Responsibilities
//! - Normalize Go-style `:port` addresses to every interface
//! - Bind the listener and report the bound address

use std::net::SocketAddr;

use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// `":8448"` becomes `"0.0.0.0:8448"`; anything else is returned unchanged.
pub fn normalize_bind_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_string()
    }
}

/// Bind a TCP listener on `address`.
pub async fn bind(address: &str) -> Result<TcpListener, ListenerError> {
    let normalized = normalize_bind_address(address);
    let listener = TcpListener::bind(&normalized)
        .await
        .map_err(|source| ListenerError::Bind {
            address: normalized.clone(),
            source,
        })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}

/// Address actually bound, with the port resolved when `:0` was requested.
pub fn local_addr(listener: &TcpListener) -> Result<SocketAddr, ListenerError> {
    listener.local_addr().map_err(|source| ListenerError::Bind {
        address: "<bound listener>".to_string(),
        source,
    })
}

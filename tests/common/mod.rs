//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use stomper_server::config::{DataSourceKind, ServerConfig};
use stomper_server::{start, PreSetup, RelayEngine, RunningServer, Shutdown, StartupError};

/// Config bound to an ephemeral loopback port with no external data source.
pub fn local_config() -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        memory_limit: -1,
        data_source: DataSourceKind::None,
        ..ServerConfig::default()
    }
}

/// An address nothing is listening on (bound then released).
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Start the relay engine with `config`.
pub async fn start_relay(
    config: ServerConfig,
    presetup: Option<PreSetup>,
) -> Result<RunningServer, StartupError> {
    start(config, RelayEngine::default(), presetup, Shutdown::new()).await
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Poll `check` until it holds or `deadline` elapses.
pub async fn eventually<F: Fn() -> bool>(check: F, deadline: Duration) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

//! Bootstrap sequence tests: health route, hook failures, fatal config.
//! Exit statuses of the built binary live in `binary.rs`.

use std::collections::HashMap;
use std::time::Duration;

use stomper_server::config::{ConfigError, Flags, ServerConfig};
use stomper_server::{PreSetup, StartupError};
use tokio::net::TcpStream;

mod common;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn health_returns_ok() {
    let running = common::start_relay(common::local_config(), None).await.unwrap();
    let addr = running.local_addr();

    let res = common::http_client()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "ok");

    running.stop().await.unwrap();
}

#[tokio::test]
async fn health_only_answers_get() {
    let running = common::start_relay(common::local_config(), None).await.unwrap();

    let res = common::http_client()
        .post(format!("http://{}/health", running.local_addr()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 405);

    running.stop().await.unwrap();
}

#[tokio::test]
async fn protocol_endpoint_requires_upgrade() {
    let running = common::start_relay(common::local_config(), None).await.unwrap();

    let res = common::http_client()
        .get(format!("http://{}/wss/websocket", running.local_addr()))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_client_error());

    running.stop().await.unwrap();
}

#[tokio::test]
async fn failing_presetup_never_listens() {
    let addr = common::unused_addr();
    let config = ServerConfig {
        bind_address: addr.to_string(),
        ..common::local_config()
    };
    let hook: PreSetup = Box::new(|_server| Err("refusing to start".into()));

    let err = common::start_relay(config, Some(hook)).await.unwrap_err();
    assert!(matches!(err, StartupError::PreSetup(_)));
    assert_eq!(err.exit_code(), 3);

    assert!(TcpStream::connect(addr).await.is_err(), "listener must not be started");
}

#[tokio::test]
async fn presetup_mutates_handle_before_setup() {
    let hook: PreSetup = Box::new(|server| {
        assert!(server.compression());
        assert!(server.data_source().is_none());
        server.set_compression(false);
        Ok(())
    });

    let running = common::start_relay(common::local_config(), Some(hook)).await.unwrap();
    assert!(!running.server().context().compression);
    assert_eq!(running.server().engine_name(), "relay");

    running.stop().await.unwrap();
}

#[tokio::test]
async fn unknown_data_source_is_fatal() {
    let vars = env(&[("DATA_SOURCE", "kafka")]);

    let err = ServerConfig::resolve(&Flags::default(), &vars).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownDataSource(_)));
    assert_eq!(err.to_string(), "unknown data source: kafka");

    let err = StartupError::from(err);
    assert_ne!(err.exit_code(), 0);
    assert!(err.before_logging());
}

#[tokio::test]
async fn non_numeric_memory_limit_fails_fast() {
    let vars = env(&[("MEMORY_LIMIT", "thirty gigs"), ("DATA_SOURCE", "none")]);

    let err = ServerConfig::resolve(&Flags::default(), &vars).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidInteger { var: "MEMORY_LIMIT", .. }));
    assert_eq!(StartupError::from(err).exit_code(), 2);
}

#[tokio::test]
async fn occupied_address_is_fatal() {
    let first = common::start_relay(common::local_config(), None).await.unwrap();
    let config = ServerConfig {
        bind_address: first.local_addr().to_string(),
        ..common::local_config()
    };

    let err = common::start_relay(config, None).await.unwrap_err();
    assert!(matches!(err, StartupError::Listener(_)));
    assert_eq!(err.exit_code(), 1);

    first.stop().await.unwrap();
}

#[tokio::test]
async fn stop_releases_listener() {
    let running = common::start_relay(common::local_config(), None).await.unwrap();
    let addr = running.local_addr();

    running.stop().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(TcpStream::connect(addr).await.is_err());
}

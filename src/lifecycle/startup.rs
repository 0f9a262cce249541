//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve and validate configuration before any side effect
//! - Install logging, apply the memory ceiling
//! - Build the server handle, attach the data source, run the pre-setup hook
//! - Finalize the handle, bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned, never retried
//! - Steps run in order on one task
//! - The listener binds last, after every fallible setup step

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, DataSourceKind, Flags, ProcessEnv, ServerConfig};
use crate::datasource::{DataSourceError, RedisDataSource};
use crate::http::HttpServer;
use crate::lifecycle::memory;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::net::listener::{self, ListenerError};
use crate::observability::logging::{self, LoggingConfig, LoggingError};
use crate::observability::metrics;
use crate::server::{EngineError, ProtocolEngine, ReadyServer, StompServer, VERSION};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Caller hook run against the handle after the data source is attached and
/// before it is finalized.
pub type PreSetup = Box<dyn FnOnce(&mut StompServer) -> Result<(), BoxError> + Send>;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("data source: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("unable to run pre-setup: {0}")]
    PreSetup(#[source] BoxError),

    #[error("engine: {0}")]
    Engine(#[from] EngineError),

    #[error("metrics exporter: {0}")]
    Metrics(String),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server: {0}")]
    Serve(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StartupError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(_) => 2,
            StartupError::PreSetup(_) => 3,
            _ => 1,
        }
    }

    /// Whether the error happened before the logger could report it.
    pub fn before_logging(&self) -> bool {
        matches!(self, StartupError::Config(_) | StartupError::Logging(_))
    }
}

/// A server accepting traffic on a background task.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    server: ReadyServer,
    task: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningServer {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that stops this server when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn server(&self) -> &ReadyServer {
        &self.server
    }

    /// Block until the server stops.
    pub async fn wait(self) -> Result<(), StartupError> {
        self.task.await??;
        Ok(())
    }

    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        self.wait().await
    }
}

/// Full process bootstrap: flags, environment, logging, then `start`, then
/// serve until SIGINT/SIGTERM.
pub async fn default_setup(
    engine: impl ProtocolEngine,
    presetup: Option<PreSetup>,
) -> Result<(), StartupError> {
    let flags = Flags::parse();
    let config = ServerConfig::resolve(&flags, &ProcessEnv)?;

    logging::init_logging(&LoggingConfig::default())?;

    let shutdown = Shutdown::new();
    let running = start(config, engine, presetup, shutdown.clone()).await?;
    signals::spawn_signal_listener(shutdown);

    running.wait().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Run the bootstrap sequence against an already resolved configuration.
///
/// Returns once the listener is bound; the server keeps running until
/// `shutdown` fires.
pub async fn start(
    config: ServerConfig,
    engine: impl ProtocolEngine,
    presetup: Option<PreSetup>,
    shutdown: Shutdown,
) -> Result<RunningServer, StartupError> {
    tracing::info!(
        bind_address = %config.bind_address,
        memory_limit = config.memory_limit,
        compression = config.compression,
        data_source = %config.data_source,
        "Configuration loaded"
    );

    let ceiling = memory::apply_memory_limit(config.memory_limit);

    let server = prepare(&config, engine, presetup).await?;

    if let Some(addr) = &config.metrics_address {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e: std::net::AddrParseError| StartupError::Metrics(e.to_string()))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let listener = listener::bind(&config.bind_address).await?;
    let local_addr = listener::local_addr(&listener)?;

    memory::spawn_watch(ceiling, memory::DEFAULT_WATCH_INTERVAL, shutdown.subscribe());

    tracing::info!(version = VERSION, address = %local_addr, "starting stomper");

    let http = HttpServer::new(server.clone());
    let task = tokio::spawn(http.run(listener, shutdown.clone()));

    Ok(RunningServer {
        local_addr,
        shutdown,
        server,
        task,
    })
}

/// Build, augment and finalize the server handle.
///
/// Failures are returned unlogged; the caller reports them once.
pub async fn prepare(
    config: &ServerConfig,
    engine: impl ProtocolEngine,
    presetup: Option<PreSetup>,
) -> Result<ReadyServer, StartupError> {
    let mut server = StompServer::new(engine, config.compression);

    if config.data_source == DataSourceKind::Redis {
        let redis = RedisDataSource::connect(&config.redis_url).await?;
        server.attach_data_source(Arc::new(redis));
    }

    if let Some(hook) = presetup {
        hook(&mut server).map_err(StartupError::PreSetup)?;
    }

    Ok(server.setup()?)
}

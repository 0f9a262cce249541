//! Structured logging.
//!
//! # Responsibilities
//! - Install the process-wide tracing subscriber exactly once
//! - Route info and above to stdout, warnings and errors also to stderr
//! - Render timestamps in ISO-8601
//!
//! # Design Decisions
//! - Two fmt layers on one registry, each with its own level filter
//! - Stdout verbosity follows `RUST_LOG` when present

use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::Registry;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// ISO-8601 with milliseconds and numeric offset, e.g. `2024-05-01T12:00:00.000+0000`.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Default stdout level when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("logger already installed: {0}")]
    Init(#[from] TryInitError),
}

#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive for stdout when `RUST_LOG` is unset.
    pub level: &'a str,
    /// Emit ANSI colors.
    pub ansi: bool,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            ansi: false,
        }
    }
}

/// Layers of the tiered subscriber, writing to `stdout` and `stderr`.
///
/// `stdout_filter` gates the first writer; the second only ever sees
/// warnings and errors.
pub fn tiered_layers<S, O, E>(
    stdout_filter: EnvFilter,
    ansi: bool,
    stdout: O,
    stderr: E,
) -> Vec<Box<dyn Layer<S> + Send + Sync + 'static>>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    O: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    E: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let timer = ChronoLocal::new(TIME_FORMAT.to_string());

    vec![
        fmt::layer()
            .with_timer(timer.clone())
            .with_ansi(ansi)
            .with_writer(stdout)
            .with_filter(stdout_filter)
            .boxed(),
        fmt::layer()
            .with_timer(timer)
            .with_ansi(ansi)
            .with_writer(stderr)
            .with_filter(LevelFilter::WARN)
            .boxed(),
    ]
}

/// Install the tiered subscriber.
///
/// # Errors
///
/// Returns `LoggingError::Init` when a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<(), LoggingError> {
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level));

    tracing_subscriber::registry()
        .with(tiered_layers::<Registry, _, _>(
            stdout_filter,
            config.ansi,
            std::io::stdout,
            std::io::stderr,
        ))
        .try_init()?;

    Ok(())
}

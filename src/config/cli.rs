//! Command-line flags.
//!
//! Every flag is optional: an absent flag falls through to the environment
//! variable and then to the compiled-in default (see `ServerConfig::resolve`).

use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "stomper-server")]
#[command(version, about = "STOMP over WebSocket server", long_about = None)]
pub struct Flags {
    /// Soft memory ceiling in bytes [env: MEMORY_LIMIT]
    #[arg(long = "memory-limit", value_name = "BYTES", allow_negative_numbers = true)]
    pub memory_limit: Option<i64>,

    /// HTTP service address [env: BIND_ADDRESS]
    #[arg(long = "addr", value_name = "ADDR")]
    pub addr: Option<String>,

    /// Enable compression, only the literal `true` enables it [env: COMPRESSION]
    #[arg(long)]
    pub compression: Option<String>,

    /// Data source, `redis` or `none` [env: DATA_SOURCE]
    #[arg(long = "data-source", value_name = "KIND")]
    pub data_source: Option<String>,

    /// Redis connection URL [env: REDIS_URL]
    #[arg(long = "redis-url", value_name = "URL")]
    pub redis_url: Option<String>,

    /// Prometheus exporter address, disabled when unset [env: METRICS_ADDRESS]
    #[arg(long = "metrics-addr", value_name = "ADDR")]
    pub metrics_addr: Option<String>,
}

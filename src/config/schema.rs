//! Configuration schema definitions.

use std::fmt;
use std::str::FromStr;

/// Default soft memory ceiling (30 GiB).
pub const DEFAULT_MEMORY_LIMIT: i64 = 32_212_254_720;

/// Default bind address, Go-style `:port` meaning every interface.
pub const DEFAULT_BIND_ADDRESS: &str = ":8448";

pub const DEFAULT_COMPRESSION: &str = "true";

pub const DEFAULT_DATA_SOURCE: &str = "redis";

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Root configuration for the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address (e.g., ":8448" or "127.0.0.1:8448").
    pub bind_address: String,

    /// Soft memory ceiling in bytes. Negative disables the ceiling.
    pub memory_limit: i64,

    /// Compression on the protocol handler.
    pub compression: bool,

    /// Backend attached to the server handle.
    pub data_source: DataSourceKind,

    /// Redis connection URL, used when `data_source` is `Redis`.
    pub redis_url: String,

    /// Prometheus exporter address; no exporter when `None`.
    pub metrics_address: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            memory_limit: DEFAULT_MEMORY_LIMIT,
            compression: parse_compression(DEFAULT_COMPRESSION),
            data_source: DataSourceKind::Redis,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            metrics_address: None,
        }
    }
}

/// Only the exact string `true` turns compression on.
pub fn parse_compression(value: &str) -> bool {
    value == "true"
}

/// Recognized data-source backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Redis,
    None,
}

impl DataSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceKind::Redis => "redis",
            DataSourceKind::None => "none",
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a data-source name outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data source: {0}")]
pub struct UnknownDataSource(pub String);

impl FromStr for DataSourceKind {
    type Err = UnknownDataSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redis" => Ok(DataSourceKind::Redis),
            "none" => Ok(DataSourceKind::None),
            other => Err(UnknownDataSource(other.to_string())),
        }
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of resolved values
//! - Validate addresses and URL schemes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::{DataSourceKind, ServerConfig};

const REDIS_SCHEMES: [&str; 4] = ["redis://", "rediss://", "redis+unix://", "unix://"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("bind address must not be empty")]
    EmptyBindAddress,

    #[error("metrics address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("redis url {0:?} must start with redis://, rediss:// or unix://")]
    InvalidRedisUrl(String),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }

    if let Some(addr) = &config.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    // Only checked when the URL is actually used.
    if config.data_source == DataSourceKind::Redis
        && !REDIS_SCHEMES
            .iter()
            .any(|scheme| config.redis_url.starts_with(scheme))
    {
        errors.push(ValidationError::InvalidRedisUrl(config.redis_url.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

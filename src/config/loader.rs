//! Configuration resolution from flags and environment.

use std::collections::HashMap;
use std::env::VarError;
use std::num::ParseIntError;

use crate::config::cli::Flags;
use crate::config::schema::{
    parse_compression, DataSourceKind, ServerConfig, UnknownDataSource, DEFAULT_BIND_ADDRESS,
    DEFAULT_COMPRESSION, DEFAULT_DATA_SOURCE, DEFAULT_MEMORY_LIMIT, DEFAULT_REDIS_URL,
};
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_MEMORY_LIMIT: &str = "MEMORY_LIMIT";
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";
pub const ENV_COMPRESSION: &str = "COMPRESSION";
pub const ENV_DATA_SOURCE: &str = "DATA_SOURCE";
pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_METRICS_ADDRESS: &str = "METRICS_ADDRESS";

/// Error type for configuration resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {var}={value:?} is not a base-10 integer: {source}")]
    InvalidInteger {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("environment variable {var} is not valid UTF-8")]
    NotUnicode { var: String },

    #[error(transparent)]
    UnknownDataSource(#[from] UnknownDataSource),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of environment variables.
pub trait EnvSource {
    /// `Ok(None)` when unset. A set but unreadable value is an error.
    fn lookup(&self, key: &str) -> Result<Option<String>, ConfigError>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode {
                var: key.to_string(),
            }),
        }
    }
}

impl EnvSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(key).cloned())
    }
}

/// Environment value if present, else `default`.
pub fn env_string(env: &impl EnvSource, key: &str, default: &str) -> Result<String, ConfigError> {
    Ok(env.lookup(key)?.unwrap_or_else(|| default.to_string()))
}

/// Flag value if given, else [`env_string`].
fn flag_or_env(
    flag: &Option<String>,
    env: &impl EnvSource,
    key: &str,
    default: &str,
) -> Result<String, ConfigError> {
    match flag {
        Some(value) => Ok(value.clone()),
        None => env_string(env, key, default),
    }
}

/// Environment value parsed as a signed base-10 integer if present, else `default`.
///
/// A present but unparseable value is an error, never a silent fallback.
pub fn env_int(env: &impl EnvSource, key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env.lookup(key)? {
        Some(value) => value
            .parse::<i64>()
            .map_err(|source| ConfigError::InvalidInteger {
                var: key,
                value,
                source,
            }),
        None => Ok(default),
    }
}

impl ServerConfig {
    /// Resolve every field as flag, else environment, else default, then validate.
    ///
    /// `MEMORY_LIMIT` is checked even when the flag overrides it, so a
    /// malformed deployment environment is caught regardless of the command line.
    pub fn resolve(flags: &Flags, env: &impl EnvSource) -> Result<Self, ConfigError> {
        let env_memory_limit = env_int(env, ENV_MEMORY_LIMIT, DEFAULT_MEMORY_LIMIT)?;
        let memory_limit = flags.memory_limit.unwrap_or(env_memory_limit);

        let bind_address = flag_or_env(&flags.addr, env, ENV_BIND_ADDRESS, DEFAULT_BIND_ADDRESS)?;
        let compression = flag_or_env(&flags.compression, env, ENV_COMPRESSION, DEFAULT_COMPRESSION)?;
        let data_source: DataSourceKind =
            flag_or_env(&flags.data_source, env, ENV_DATA_SOURCE, DEFAULT_DATA_SOURCE)?.parse()?;
        let redis_url = flag_or_env(&flags.redis_url, env, ENV_REDIS_URL, DEFAULT_REDIS_URL)?;

        let metrics_address = match &flags.metrics_addr {
            Some(addr) => Some(addr.clone()),
            None => env.lookup(ENV_METRICS_ADDRESS)?,
        }
        .filter(|addr| !addr.is_empty());

        let config = ServerConfig {
            bind_address,
            memory_limit,
            compression: parse_compression(&compression),
            data_source,
            redis_url,
            metrics_address,
        };

        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_string_prefers_present_value() {
        let vars = env(&[("BIND_ADDRESS", "127.0.0.1:1")]);
        assert_eq!(env_string(&vars, "BIND_ADDRESS", ":8448").unwrap(), "127.0.0.1:1");
        assert_eq!(env_string(&vars, "MISSING", "fallback").unwrap(), "fallback");
    }

    #[test]
    fn env_string_keeps_empty_value() {
        let vars = env(&[("COMPRESSION", "")]);
        assert_eq!(env_string(&vars, "COMPRESSION", "true").unwrap(), "");
    }

    #[test]
    fn env_int_parses_signed_values() {
        let vars = env(&[("MEMORY_LIMIT", "-42")]);
        assert_eq!(env_int(&vars, "MEMORY_LIMIT", 7).unwrap(), -42);
        assert_eq!(env_int(&vars, "OTHER", 7).unwrap(), 7);
    }

    #[test]
    fn env_int_rejects_garbage() {
        let vars = env(&[("MEMORY_LIMIT", "lots")]);
        let err = env_int(&vars, "MEMORY_LIMIT", 7).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidInteger { var: "MEMORY_LIMIT", ref value, .. } if value == "lots"
        ));
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ServerConfig::resolve(&Flags::default(), &env(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn environment_overrides_defaults() {
        let vars = env(&[
            ("MEMORY_LIMIT", "1048576"),
            ("BIND_ADDRESS", "127.0.0.1:9100"),
            ("COMPRESSION", "false"),
            ("DATA_SOURCE", "none"),
            ("METRICS_ADDRESS", "127.0.0.1:9101"),
        ]);
        let config = ServerConfig::resolve(&Flags::default(), &vars).unwrap();

        assert_eq!(config.memory_limit, 1_048_576);
        assert_eq!(config.bind_address, "127.0.0.1:9100");
        assert!(!config.compression);
        assert_eq!(config.data_source, DataSourceKind::None);
        assert_eq!(config.metrics_address.as_deref(), Some("127.0.0.1:9101"));
    }

    #[test]
    fn flags_override_environment() {
        let vars = env(&[
            ("MEMORY_LIMIT", "1048576"),
            ("BIND_ADDRESS", "127.0.0.1:9100"),
            ("COMPRESSION", "false"),
            ("DATA_SOURCE", "none"),
        ]);
        let flags = Flags {
            memory_limit: Some(2048),
            addr: Some("127.0.0.1:9200".into()),
            compression: Some("true".into()),
            data_source: Some("redis".into()),
            redis_url: Some("redis://cache:6379".into()),
            metrics_addr: None,
        };
        let config = ServerConfig::resolve(&flags, &vars).unwrap();

        assert_eq!(config.memory_limit, 2048);
        assert_eq!(config.bind_address, "127.0.0.1:9200");
        assert!(config.compression);
        assert_eq!(config.data_source, DataSourceKind::Redis);
        assert_eq!(config.redis_url, "redis://cache:6379");
    }

    #[test]
    fn unknown_data_source_is_rejected() {
        let vars = env(&[("DATA_SOURCE", "kafka")]);
        let err = ServerConfig::resolve(&Flags::default(), &vars).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDataSource(UnknownDataSource(ref s)) if s == "kafka"));
    }

    #[test]
    fn malformed_env_fails_even_with_flag() {
        let vars = env(&[("MEMORY_LIMIT", "30GiB")]);
        let flags = Flags {
            memory_limit: Some(1),
            ..Flags::default()
        };
        assert!(matches!(
            ServerConfig::resolve(&flags, &vars),
            Err(ConfigError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn validation_errors_surface() {
        let vars = env(&[("BIND_ADDRESS", ""), ("METRICS_ADDRESS", "nowhere")]);
        match ServerConfig::resolve(&Flags::default(), &vars) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_process_env_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        const KEY: &str = "STOMPER_TEST_NON_UNICODE_LIMIT";
        std::env::set_var(KEY, OsStr::from_bytes(b"3\xff0"));

        let err = env_int(&ProcessEnv, KEY, 7).unwrap_err();
        assert!(matches!(err, ConfigError::NotUnicode { ref var } if var == KEY));
        assert!(env_string(&ProcessEnv, KEY, "fallback").is_err());

        std::env::remove_var(KEY);
        assert_eq!(env_int(&ProcessEnv, KEY, 7).unwrap(), 7);
    }
}

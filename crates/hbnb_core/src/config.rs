//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve the registry file path and logging settings at startup.
//! - Normalize raw values before they reach storage or logging.
//!
//! # Invariants
//! - Blank variables behave as unset.
//! - `log_dir` is always absolute after resolution.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Registry file path override.
pub const ENV_FILE_PATH: &str = "HBNB_FILE_PATH";
/// Log level override (`error`..`trace`, `warning` accepted).
pub const ENV_LOG_LEVEL: &str = "HBNB_LOG_LEVEL";
/// Absolute log directory override.
pub const ENV_LOG_DIR: &str = "HBNB_LOG_DIR";

const DEFAULT_FILE_PATH: &str = "file.json";
const DEFAULT_LOG_DIR_NAME: &str = "hbnb-logs";

/// Configuration resolution error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{ENV_LOG_LEVEL}: {message}"),
            Self::RelativeLogDir(value) => {
                write!(f, "{ENV_LOG_DIR} must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Startup settings for the shell binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Registry JSON file.
    pub file_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: &'static str,
    /// Absolute directory for rotating log files.
    pub log_dir: PathBuf,
}

impl ShellConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let file_path = read(ENV_FILE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_PATH));

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(raw) => normalize_level(&raw).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        let log_dir = match read(ENV_LOG_DIR) {
            Some(raw) => {
                let path = PathBuf::from(&raw);
                if !path.is_absolute() {
                    return Err(ConfigError::RelativeLogDir(raw));
                }
                path
            }
            None => std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        };

        Ok(Self {
            file_path,
            log_level,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ShellConfig, ENV_FILE_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = ShellConfig::from_lookup(lookup(&[(ENV_FILE_PATH, "   ")]))
            .expect("blank path should fall back to default");
        assert_eq!(config.file_path, PathBuf::from("file.json"));
        assert!(config.log_dir.is_absolute());
        assert!(config.log_dir.ends_with("hbnb-logs"));
    }

    #[test]
    fn values_are_normalized() {
        let log_dir = std::env::temp_dir().join("hbnb-config-test");
        let config = ShellConfig::from_lookup(lookup(&[
            (ENV_FILE_PATH, " data/objects.json "),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_LOG_DIR, log_dir.to_str().expect("tempdir path should be utf-8")),
        ]))
        .expect("config should resolve");
        assert_eq!(config.file_path, PathBuf::from("data/objects.json"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, log_dir);
    }

    #[test]
    fn rejects_bad_level_and_relative_dir() {
        let err = ShellConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")]))
            .expect_err("unknown level should be rejected");
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));

        let err = ShellConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "logs")]))
            .expect_err("relative log dir should be rejected");
        assert_eq!(err, ConfigError::RelativeLogDir("logs".to_string()));
    }
}

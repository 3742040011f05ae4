//! Watch Service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:watch.db";

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default per-check fetch timeout in seconds.
pub const DEFAULT_CHECK_TIMEOUT_SECONDS: u64 = 5;

/// Upper bound for the per-check fetch timeout in seconds.
pub const MAX_CHECK_TIMEOUT_SECONDS: u64 = 300;

/// Watch Service configuration.
#[derive(Clone)]
pub struct Config {
    /// SQLite connection URL for the match store.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Time a single check may spend fetching the watched URL.
    pub check_timeout_seconds: u64,
}

/// Custom Debug implementation that redacts the database URL.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("check_timeout_seconds", &self.check_timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid check timeout configuration: {0}")]
    InvalidCheckTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let check_timeout_seconds = if let Some(value_str) = vars.get("CHECK_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCheckTimeout(format!(
                    "CHECK_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidCheckTimeout(
                    "CHECK_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_CHECK_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidCheckTimeout(format!(
                    "CHECK_TIMEOUT_SECONDS must not exceed {} seconds, got {}",
                    MAX_CHECK_TIMEOUT_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_CHECK_TIMEOUT_SECONDS
        };

        Ok(Config {
            database_url,
            bind_address,
            check_timeout_seconds,
        })
    }

    /// Per-check fetch timeout as a `Duration`.
    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_seconds)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_success_with_defaults() {
        let vars = HashMap::new();

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.check_timeout_seconds, DEFAULT_CHECK_TIMEOUT_SECONDS);
        assert_eq!(config.check_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "sqlite:/var/lib/watch/matches.db".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string()),
            ("CHECK_TIMEOUT_SECONDS".to_string(), "1".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.database_url, "sqlite:/var/lib/watch/matches.db");
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.check_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_check_timeout_rejects_zero() {
        let vars = HashMap::from([("CHECK_TIMEOUT_SECONDS".to_string(), "0".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidCheckTimeout(msg)) if msg.contains("must be greater than 0"))
        );
    }

    #[test]
    fn test_check_timeout_rejects_negative() {
        let vars = HashMap::from([("CHECK_TIMEOUT_SECONDS".to_string(), "-5".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidCheckTimeout(msg)) if msg.contains("must be a valid positive integer"))
        );
    }

    #[test]
    fn test_check_timeout_rejects_too_large() {
        let vars = HashMap::from([("CHECK_TIMEOUT_SECONDS".to_string(), "301".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidCheckTimeout(msg)) if msg.contains("must not exceed 300"))
        );
    }

    #[test]
    fn test_check_timeout_accepts_max() {
        let vars = HashMap::from([("CHECK_TIMEOUT_SECONDS".to_string(), "300".to_string())]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.check_timeout_seconds, 300);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let vars = HashMap::from([(
            "DATABASE_URL".to_string(),
            "sqlite:/secret/location.db".to_string(),
        )]);
        let config = Config::from_vars(&vars).expect("Config should load successfully");

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("/secret/location.db"));
    }
}

//! Process configuration read from the environment.

use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::blockchain::chain::{is_valid_difficulty, DEFAULT_DIFFICULTY};

const HOST_KEY: &str = "LEDGER_HOST";
const PORT_KEY: &str = "LEDGER_PORT";
const DIFFICULTY_KEY: &str = "LEDGER_DIFFICULTY";
const ALLOWED_ORIGIN_KEY: &str = "LEDGER_ALLOWED_ORIGIN";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Errors that can occur while loading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Difficulty must be between 1 and 6, got {0}")]
    DifficultyOutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP server binds to
    pub host: String,

    /// Port the HTTP server binds to
    pub port: u16,

    /// Starting difficulty of the ledger
    pub difficulty: u8,

    /// Origin allowed by the CORS policy
    pub allowed_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            difficulty: DEFAULT_DIFFICULTY,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from `LEDGER_*` environment variables
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup(HOST_KEY) {
            config.host = host;
        }

        if let Some(port) = lookup(PORT_KEY) {
            config.port = parse(PORT_KEY, &port)?;
        }

        if let Some(difficulty) = lookup(DIFFICULTY_KEY) {
            let difficulty: i64 = parse(DIFFICULTY_KEY, &difficulty)?;
            if !is_valid_difficulty(difficulty) {
                return Err(ConfigError::DifficultyOutOfRange(difficulty));
            }
            config.difficulty = difficulty as u8;
        }

        if let Some(origin) = lookup(ALLOWED_ORIGIN_KEY) {
            config.allowed_origin = origin;
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.allowed_origin, "http://localhost:3000");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (HOST_KEY, "0.0.0.0"),
            (PORT_KEY, "9000"),
            (DIFFICULTY_KEY, "2"),
            (ALLOWED_ORIGIN_KEY, "https://ledger.example"),
        ])
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.allowed_origin, "https://ledger.example");
    }

    #[test]
    fn test_invalid_port() {
        assert_eq!(
            load(&[(PORT_KEY, "eighty")]).unwrap_err(),
            ConfigError::InvalidValue {
                key: PORT_KEY,
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_difficulty_out_of_range() {
        assert_eq!(
            load(&[(DIFFICULTY_KEY, "9")]).unwrap_err(),
            ConfigError::DifficultyOutOfRange(9)
        );
        assert_eq!(
            load(&[(DIFFICULTY_KEY, "0")]).unwrap_err(),
            ConfigError::DifficultyOutOfRange(0)
        );
    }
}

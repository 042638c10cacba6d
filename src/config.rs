use std::collections::HashMap;
use std::env;
use std::fmt;
use std::ops::RangeInclusive;

use crate::auth::token::DEFAULT_TTL_SECS;

/// Work factors bcrypt accepts.
const BCRYPT_COSTS: RangeInclusive<u32> = 4..=31;

/// Runtime configuration, read from the environment (and `.env`, loaded by `main`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL. When unset the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub token_ttl_secs: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            token_ttl_secs: within(
                "TOKEN_TTL_SECS",
                parse_or(&lookup, "TOKEN_TTL_SECS", DEFAULT_TTL_SECS)?,
                1..=i64::MAX,
            )?,
            bcrypt_cost: within(
                "BCRYPT_COST",
                parse_or(&lookup, "BCRYPT_COST", 10)?,
                BCRYPT_COSTS,
            )?,
        })
    }

    pub fn from_map(vars: &HashMap<&str, &str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Rejects parsed values that would only fail later, at request time.
fn within<T>(key: &'static str, value: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: PartialOrd + fmt::Display,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_defaults() {
        let vars = HashMap::from([("JWT_SECRET", "s3cret")]);
        let config = Config::from_map(&vars).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.token_ttl_secs, 3600);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_custom_values() {
        let vars = HashMap::from([
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://test"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("TOKEN_TTL_SECS", "60"),
        ]);
        let config = Config::from_map(&vars).unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://test"));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.token_ttl_secs, 60);
    }

    #[test]
    fn test_config_errors() {
        let vars = HashMap::new();
        assert_eq!(
            Config::from_map(&vars).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );

        let vars = HashMap::from([("JWT_SECRET", "s3cret"), ("SERVER_PORT", "http")]);
        assert_eq!(
            Config::from_map(&vars).unwrap_err(),
            ConfigError::Invalid {
                key: "SERVER_PORT",
                value: "http".into()
            }
        );
    }

    #[test]
    fn test_config_rejects_out_of_range_values() {
        for ttl in ["0", "-60"] {
            let vars = HashMap::from([("JWT_SECRET", "s3cret"), ("TOKEN_TTL_SECS", ttl)]);
            assert_eq!(
                Config::from_map(&vars).unwrap_err(),
                ConfigError::Invalid {
                    key: "TOKEN_TTL_SECS",
                    value: ttl.into()
                }
            );
        }

        for cost in ["3", "32"] {
            let vars = HashMap::from([("JWT_SECRET", "s3cret"), ("BCRYPT_COST", cost)]);
            assert_eq!(
                Config::from_map(&vars).unwrap_err(),
                ConfigError::Invalid {
                    key: "BCRYPT_COST",
                    value: cost.into()
                }
            );
        }

        let vars = HashMap::from([
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_SECS", "1"),
            ("BCRYPT_COST", "4"),
        ]);
        let config = Config::from_map(&vars).unwrap();
        assert_eq!(config.token_ttl_secs, 1);
        assert_eq!(config.bcrypt_cost, 4);
    }
}

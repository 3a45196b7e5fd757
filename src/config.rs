use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub reconcile_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://school.db".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            db_max_connections: 5,
            reconcile_timeout: Duration::from_millis(5000),
        }
    }
}

impl Config {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);
        let bind_addr = parse_var(&lookup, "BIND_ADDR")?.unwrap_or(defaults.bind_addr);
        let db_max_connections =
            parse_var(&lookup, "DB_MAX_CONNECTIONS")?.unwrap_or(defaults.db_max_connections);
        let reconcile_timeout = parse_var::<u64, _>(&lookup, "RECONCILE_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.reconcile_timeout);

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections,
            reconcile_timeout,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).expect("config");
        assert_eq!(config.database_url, "sqlite://school.db");
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.reconcile_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite://other.db"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("DB_MAX_CONNECTIONS", "2"),
            ("RECONCILE_TIMEOUT_MS", "250"),
        ]))
        .expect("config");
        assert_eq!(config.database_url, "sqlite://other.db");
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.db_max_connections, 2);
        assert_eq!(config.reconcile_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("RECONCILE_TIMEOUT_MS", "soon")]))
            .expect_err("should fail");
        assert!(err.to_string().contains("RECONCILE_TIMEOUT_MS"));
    }
}

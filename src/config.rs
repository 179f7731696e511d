//! Server configuration from environment variables
//!
//! ```bash
//! STATS_BIND_ADDR=0.0.0.0:3030
//! STATS_STORE=sqlite            # or "memory"
//! STATS_DB_PATH=data/stats.db
//! STATS_JWT_SECRET=your-super-secret-key-at-least-32-chars
//! STATS_RESET_SECRET=another-secret   # reset endpoint disabled when unset
//! STATS_MAX_BATCH=500
//! STATS_MAX_AMOUNT=9999999
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::validation::EventLimits;

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where timeframe rows live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub jwt_secret: String,
    pub reset_secret: Option<String>,
    pub limits: EventLimits,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = parse_or("STATS_BIND_ADDR", get("STATS_BIND_ADDR"), || {
            SocketAddr::from(([0, 0, 0, 0], 3030))
        })?;

        let db_path = get("STATS_DB_PATH").unwrap_or_else(|| "data/stats.db".to_string());
        let store = match get("STATS_STORE").map(|s| s.to_ascii_lowercase()).as_deref() {
            None | Some("sqlite") => StoreBackend::Sqlite(PathBuf::from(db_path)),
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STATS_STORE",
                    reason: format!("unknown backend '{}', expected 'sqlite' or 'memory'", other),
                })
            }
        };

        let jwt_secret = get("STATS_JWT_SECRET").ok_or(ConfigError::Missing("STATS_JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "STATS_JWT_SECRET",
                reason: format!("must be at least {} characters", MIN_SECRET_LEN),
            });
        }

        let defaults = EventLimits::default();
        let limits = EventLimits {
            max_batch_size: parse_or("STATS_MAX_BATCH", get("STATS_MAX_BATCH"), || defaults.max_batch_size)?,
            max_amount: parse_or("STATS_MAX_AMOUNT", get("STATS_MAX_AMOUNT"), || defaults.max_amount)?,
        };

        Ok(Self {
            bind_addr,
            store,
            jwt_secret,
            reset_secret: get("STATS_RESET_SECRET"),
            limits,
        })
    }
}

fn parse_or<T, D>(name: &'static str, value: Option<String>, default: D) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> T,
{
    match value {
        None => Ok(default()),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-that-is-at-least-32-characters-long";

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("STATS_JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3030");
        assert_eq!(config.store, StoreBackend::Sqlite(PathBuf::from("data/stats.db")));
        assert_eq!(config.reset_secret, None);
        assert_eq!(config.limits, EventLimits::default());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("STATS_JWT_SECRET", SECRET),
            ("STATS_BIND_ADDR", "127.0.0.1:8080"),
            ("STATS_STORE", "Memory"),
            ("STATS_RESET_SECRET", "wipe-day"),
            ("STATS_MAX_BATCH", "100"),
            ("STATS_MAX_AMOUNT", "5000"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.reset_secret.as_deref(), Some("wipe-day"));
        assert_eq!(config.limits.max_batch_size, 100);
        assert_eq!(config.limits.max_amount, 5000);
    }

    #[test]
    fn test_secret_is_required_and_long_enough() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("STATS_JWT_SECRET"));
        assert!(matches!(
            config(&[("STATS_JWT_SECRET", "short")]),
            Err(ConfigError::Invalid { name: "STATS_JWT_SECRET", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            config(&[("STATS_JWT_SECRET", SECRET), ("STATS_STORE", "postgres")]),
            Err(ConfigError::Invalid { name: "STATS_STORE", .. })
        ));
        assert!(matches!(
            config(&[("STATS_JWT_SECRET", SECRET), ("STATS_MAX_BATCH", "lots")]),
            Err(ConfigError::Invalid { name: "STATS_MAX_BATCH", .. })
        ));
    }
}

// crates/server/src/config.rs
//! Server configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CHANNEL_CAPACITY: usize = 8;
const DEFAULT_KEEP_ALIVE_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Events buffered per subscriber before further events are dropped.
    pub channel_capacity: usize,
    /// Upper bound on one sub-task's run time; `None` waits indefinitely.
    pub subtask_timeout: Option<Duration>,
    /// Interval between SSE keep-alive comments.
    pub keep_alive: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            subtask_timeout: None,
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                              | Default   |
    /// |--------------------------------------|-----------|
    /// | `ASSET_PROGRESS_HOST`                | `0.0.0.0` |
    /// | `ASSET_PROGRESS_PORT`, then `PORT`   | `8080`    |
    /// | `PROGRESS_CHANNEL_CAPACITY`          | `8`       |
    /// | `SUBTASK_TIMEOUT_SECS`               | unset     |
    /// | `SSE_KEEP_ALIVE_SECS`                | `15`      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("ASSET_PROGRESS_HOST").unwrap_or(defaults.host);

        let port = match lookup("ASSET_PROGRESS_PORT") {
            Some(v) => parse("ASSET_PROGRESS_PORT", "a port number", &v)?,
            None => match lookup("PORT") {
                Some(v) => parse("PORT", "a port number", &v)?,
                None => defaults.port,
            },
        };

        let channel_capacity = match lookup("PROGRESS_CHANNEL_CAPACITY") {
            Some(v) => match parse::<usize>("PROGRESS_CHANNEL_CAPACITY", "a positive integer", &v)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        var: "PROGRESS_CHANNEL_CAPACITY",
                        expected: "a positive integer",
                        value: v,
                    })
                }
                n => n,
            },
            None => defaults.channel_capacity,
        };

        let subtask_timeout = lookup("SUBTASK_TIMEOUT_SECS")
            .map(|v| positive_secs("SUBTASK_TIMEOUT_SECS", v))
            .transpose()?;

        let keep_alive = match lookup("SSE_KEEP_ALIVE_SECS") {
            Some(v) => positive_secs("SSE_KEEP_ALIVE_SECS", v)?,
            None => defaults.keep_alive,
        };

        Ok(Self {
            host,
            port,
            channel_capacity,
            subtask_timeout,
            keep_alive,
        })
    }

    /// `host:port` for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: std::str::FromStr>(
    var: &'static str,
    expected: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        expected,
        value: value.to_string(),
    })
}

/// Parse a strictly positive duration in whole seconds.
fn positive_secs(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    const EXPECTED: &str = "a positive number of seconds";
    match parse::<u64>(var, EXPECTED, &value)? {
        0 => Err(ConfigError::Invalid {
            var,
            expected: EXPECTED,
            value,
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_port_precedence() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "9000")])).unwrap();
        assert_eq!(config.port, 9000);

        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("ASSET_PROGRESS_PORT", "9100"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9100);
    }

    #[test]
    fn test_timeout_and_capacity() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SUBTASK_TIMEOUT_SECS", "30"),
            ("PROGRESS_CHANNEL_CAPACITY", "2"),
            ("SSE_KEEP_ALIVE_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.subtask_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.channel_capacity, 2);
        assert_eq!(config.keep_alive, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = ServerConfig::from_lookup(lookup(&[("PROGRESS_CHANNEL_CAPACITY", "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "PROGRESS_CHANNEL_CAPACITY",
                expected: "a positive integer",
                value: "0".to_string(),
            }
        );

        let err = ServerConfig::from_lookup(lookup(&[("SSE_KEEP_ALIVE_SECS", "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "SSE_KEEP_ALIVE_SECS",
                expected: "a positive number of seconds",
                value: "0".to_string(),
            }
        );

        let err = ServerConfig::from_lookup(lookup(&[("SUBTASK_TIMEOUT_SECS", "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "SUBTASK_TIMEOUT_SECS",
                expected: "a positive number of seconds",
                value: "0".to_string(),
            }
        );

        let err = ServerConfig::from_lookup(lookup(&[("SUBTASK_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("SUBTASK_TIMEOUT_SECS"));
    }
}

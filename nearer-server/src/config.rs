//! nearer-server runtime configuration
//!
//! Built from the TOML bootstrap file, with command-line overrides applied
//! on top.

use crate::error::{Error, Result};
use crate::playback::{QueueHooks, QueueOptions};
use crate::retry::RetryPolicy;
use nearer_common::config::{ResolverConfig, TomlConfig};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Settings given on the command line; `None` keeps the file's value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_history: usize,
    pub require_identification: bool,
    /// Zero disables periodic progress events
    pub progress_interval: Duration,
    pub retry: RetryPolicy,
    pub event_capacity: usize,
    pub resolver: ResolverConfig,
    pub log_level: String,
}

impl ServerConfig {
    pub fn from_toml(toml: TomlConfig, overrides: &Overrides) -> Result<Self> {
        let port = overrides.port.unwrap_or(toml.port);
        let address = overrides
            .bind_address
            .as_deref()
            .unwrap_or(&toml.bind_address);
        let ip: IpAddr = address
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", address, e)))?;

        Ok(Self {
            bind: SocketAddr::new(ip, port),
            max_history: toml.queue.max_history,
            require_identification: toml.queue.require_identification,
            progress_interval: Duration::from_secs(toml.queue.progress_interval_secs),
            retry: RetryPolicy::from(&toml.retry),
            event_capacity: toml.events.capacity,
            resolver: toml.resolver,
            log_level: overrides
                .log_level
                .clone()
                .unwrap_or(toml.logging.level),
        })
    }

    pub fn queue_options(&self, hooks: QueueHooks) -> QueueOptions {
        QueueOptions {
            max_history: self.max_history,
            retry: self.retry,
            hooks,
        }
    }

    /// Tracing filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> String {
        let level = &self.log_level;
        format!("nearer_server={level},nearer_common={level},tower_http={level}")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        // Built-in defaults always parse
        match Self::from_toml(TomlConfig::default(), &Overrides::default()) {
            Ok(config) => config,
            Err(e) => unreachable!("default configuration is invalid: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_history, 7);
        assert!(config.require_identification);
        assert_eq!(config.progress_interval, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(
            config.default_log_filter(),
            "nearer_server=info,nearer_common=info,tower_http=info"
        );
    }

    #[test]
    fn test_overrides_win_over_file() {
        let toml = TomlConfig::from_toml_str(
            r#"
            port = 6000
            bind_address = "127.0.0.1"

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();
        let overrides = Overrides {
            port: Some(7000),
            bind_address: None,
            log_level: Some("debug".to_string()),
        };

        let config = ServerConfig::from_toml(toml, &overrides).unwrap();
        assert_eq!(config.bind, "127.0.0.1:7000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_bind_address() {
        let overrides = Overrides {
            bind_address: Some("not-an-ip".to_string()),
            ..Overrides::default()
        };
        let result = ServerConfig::from_toml(TomlConfig::default(), &overrides);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("not-an-ip")));
    }
}

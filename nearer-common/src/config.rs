//! Configuration loading and config file resolution
//!
//! Bootstrap settings come from a TOML file. Every field has a built-in
//! default, so a missing file only produces a warning.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config directory (`~/.config/nearer/config.toml` on Linux)
//! 4. System config (`/etc/nearer/config.toml`, Unix only)
//! 5. Built-in defaults (no file)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NEARER_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address to bind the HTTP server to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Queue behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Already-played tracks kept for display
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Reject add/next/pause from sessions that never sent `user`
    #[serde(default = "default_true")]
    pub require_identification: bool,

    /// Seconds between progress broadcasts while playing (0 disables)
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,
}

/// Which resolver backs `add`
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// Static table from `[[resolver.catalog]]`
    #[default]
    Catalog,
    /// External resolution service over HTTP
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    #[serde(default)]
    pub kind: ResolverKind,

    /// Base URL of the resolution service (required for `kind = "http"`)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-request timeout for resolver and probe calls
    #[serde(default = "default_resolver_timeout_ms")]
    pub timeout_ms: u64,

    /// Issue a HEAD request against each resolved stream before queueing it
    #[serde(default = "default_true")]
    pub probe: bool,

    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

/// One statically configured track
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    /// Reference clients pass to `add`
    pub key: String,
    pub url: String,
    pub title: String,
    /// Seconds
    pub duration: u64,
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub thumb_big: String,
}

/// Bounded retry policy for resolve + probe
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// Events buffered per subscriber before the slowest one starts lagging
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    5000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_history() -> usize {
    7
}

fn default_progress_interval_secs() -> u64 {
    5
}

fn default_resolver_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_backoff_ms() -> u64 {
    50
}

fn default_max_backoff_ms() -> u64 {
    1000
}

fn default_event_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            queue: QueueConfig::default(),
            resolver: ResolverConfig::default(),
            retry: RetryConfig::default(),
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            require_identification: true,
            progress_interval_secs: default_progress_interval_secs(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            kind: ResolverKind::default(),
            endpoint: None,
            timeout_ms: default_resolver_timeout_ms(),
            probe: true,
            catalog: Vec::new(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration, falling back to defaults when no file is present
    ///
    /// A file that exists but fails to parse is an error; a missing file is
    /// not.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.events.capacity == 0 {
            return Err(Error::Config("events.capacity must be at least 1".to_string()));
        }
        if self.resolver.kind == ResolverKind::Http && self.resolver.endpoint.is_none() {
            return Err(Error::Config(
                "resolver.endpoint is required when resolver.kind = \"http\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve which config file to read
///
/// Returns `None` when neither an explicit path nor a standard location
/// yields a file.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3-4: standard locations
    default_config_locations().into_iter().find(|p| p.exists())
}

/// Standard config file locations for the platform, most specific first
pub fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("nearer").join("config.toml"));
    }
    if cfg!(unix) {
        locations.push(PathBuf::from("/etc/nearer/config.toml"));
    }
    locations
}

//! Common error types for Nearer

use thiserror::Error;

/// Common result type for Nearer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by the server and the client
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed TOML configuration file
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed event payload
    #[error("Event decode error: {0}")]
    Json(#[from] serde_json::Error),
}

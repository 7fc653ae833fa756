//! Error types for nearer-server
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for nearer-server
#[derive(Error, Debug)]
pub enum Error {
    /// Track reference cannot be resolved to a stream (permanent)
    #[error("Cannot resolve '{track_ref}': {reason}")]
    Resolution { track_ref: String, reason: String },

    /// Stream stayed unplayable for every retry attempt
    #[error("Stream for '{track_ref}' unavailable after {attempts} attempts: {last_error}")]
    StreamUnavailable {
        track_ref: String,
        attempts: u32,
        last_error: String,
    },

    /// Command is meaningless for this session or queue state; treated as a no-op
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Command names a session that is not connected
    #[error("Unknown session: {0}")]
    UnknownSession(Uuid),

    /// Malformed command payload
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// nearer-common errors
    #[error(transparent)]
    Common(#[from] nearer_common::Error),
}

/// Convenience Result type using nearer-server Error
pub type Result<T> = std::result::Result<T, Error>;

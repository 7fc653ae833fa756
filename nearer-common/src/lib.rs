//! # Nearer Common Library
//!
//! Shared code for the Nearer server and its command-line client:
//! - Wire event types (`NearerEvent`) and the `EventBus`
//! - Track and playback status value types
//! - TOML configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{render_queue, NearerEvent, PlaybackStatus, Track};

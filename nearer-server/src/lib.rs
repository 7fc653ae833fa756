//! # Nearer Server Library (nearer-server)
//!
//! Shared playback queue for a group of networked listeners.
//!
//! **Purpose:** Any client may add a track, skip the current one, or toggle
//! pause; every client observes the same queue, cursor and playback status.
//!
//! **Architecture:** A single `QueueManager` owns queue + cursor + status
//! under one lock. Client commands arrive over HTTP, player notifications
//! arrive through a channel drained by one pump task, and outbound events fan
//! out to clients over SSE.

pub mod api;
pub mod config;
pub mod error;
pub mod playback;
pub mod resolver;
pub mod retry;
pub mod sessions;
pub mod sse;

pub use error::{Error, Result};
pub use playback::QueueManager;

//! Playback status value type

use serde::{Deserialize, Serialize};

/// Playback status as seen by every connected client
///
/// Transitions are owned by the server's status machine; this type only
/// names the states and how they travel on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing is playing (initial state, and after the queue is exhausted)
    #[default]
    Stopped,
    /// A play or skip was issued; waiting for the player to confirm
    Buffering,
    /// Player confirmed playback
    Playing,
    /// Player confirmed pause
    Paused,
}

impl PlaybackStatus {
    /// True while a track is loaded in the player (playing, paused or buffering)
    pub fn is_active(self) -> bool {
        !matches!(self, PlaybackStatus::Stopped)
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Stopped => write!(f, "stopped"),
            PlaybackStatus::Buffering => write!(f, "buffering"),
            PlaybackStatus::Playing => write!(f, "playing"),
            PlaybackStatus::Paused => write!(f, "paused"),
        }
    }
}

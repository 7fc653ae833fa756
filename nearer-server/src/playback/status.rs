//! Playback status state machine
//!
//! ```text
//!            add (queue was exhausted)
//!   Stopped ───────────────────────────► Buffering
//!      ▲                                    │ native PlaybackStarted
//!      │ skip / track end                   ▼
//!      │ (queue exhausted)   ┌───────── Playing ◄──┐
//!      └─────────────────────┤             │       │ native PlaybackStarted
//!                            │             ▼       │ (resume)
//!                            └───────── Paused ────┘
//!   skip / track end with tracks remaining: any active state → Buffering
//! ```
//!
//! Native notifications are authoritative: they apply from any state, since
//! the player knows better than our model what it is doing.

use nearer_common::PlaybackStatus;
use tracing::{debug, warn};

/// Inputs that move the status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// A track was added to an exhausted queue and playback was started
    Enqueued,
    /// The cursor moved past the current track (skip or natural end)
    Advanced { exhausted: bool },
    /// Player reported that playback started or resumed
    NativeStarted,
    /// Player reported that playback paused
    NativePaused,
}

/// Pure transition function
///
/// The target state depends only on the event: advances and native
/// notifications land in the same state whatever the model believed before.
pub fn transition(event: StatusEvent) -> PlaybackStatus {
    match event {
        StatusEvent::Enqueued => PlaybackStatus::Buffering,
        StatusEvent::Advanced { exhausted: true } => PlaybackStatus::Stopped,
        StatusEvent::Advanced { exhausted: false } => PlaybackStatus::Buffering,
        StatusEvent::NativeStarted => PlaybackStatus::Playing,
        StatusEvent::NativePaused => PlaybackStatus::Paused,
    }
}

/// Holder for the current status; the only way to change it is `apply`
#[derive(Debug, Default)]
pub struct StatusMachine {
    status: PlaybackStatus,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PlaybackStatus {
        self.status
    }

    /// Apply an event and return the resulting status
    pub fn apply(&mut self, event: StatusEvent) -> PlaybackStatus {
        let next = transition(event);
        if self.status == PlaybackStatus::Stopped && event != StatusEvent::Enqueued {
            warn!(
                to = %next,
                ?event,
                "Leaving Stopped on a player notification, applying as authoritative"
            );
        }
        if next != self.status {
            debug!(from = %self.status, to = %next, ?event, "Playback status changed");
        }
        self.status = next;
        next
    }
}

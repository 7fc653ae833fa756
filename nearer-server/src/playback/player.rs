//! Native player boundary
//!
//! The player owns an ordered media list and a play cursor. Commands are
//! plain synchronous calls that return immediately; everything the player
//! has to say comes back later as a `PlayerNotification` sent from the
//! player's own thread. Implementations must never invoke a notification
//! synchronously from inside a command call.
//!
//! Appending to a list whose playback ran off the end (as opposed to being
//! stopped) resumes playback with the appended item.

use nearer_common::Track;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One entry in the player's media list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    /// Same id as the queue's `Track`
    pub id: Uuid,
    pub url: String,
    pub duration: Duration,
}

impl From<&Track> for MediaSource {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            url: track.url.clone(),
            duration: Duration::from_secs(track.duration),
        }
    }
}

/// Asynchronous notifications raised by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerNotification {
    /// Media item played to its end
    TrackEnded { media_id: Uuid },
    /// Playback of a media item started or resumed
    PlaybackStarted { media_id: Uuid },
    /// Playback paused
    PlaybackPaused { media_id: Uuid },
}

pub type NotificationSender = mpsc::UnboundedSender<PlayerNotification>;
pub type NotificationReceiver = mpsc::UnboundedReceiver<PlayerNotification>;

/// Channel carrying notifications from the player thread to the queue manager
pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::unbounded_channel()
}

/// Elapsed time and total duration of the current media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub elapsed: Duration,
    pub duration: Duration,
}

impl Progress {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// Commands accepted by a native playback engine
pub trait NativePlayer: Send + Sync {
    /// Replace the media list; playback does not start until `play_at`
    fn set_playlist(&self, items: Vec<MediaSource>);

    /// Append to the media list without disturbing current playback
    fn append(&self, item: MediaSource);

    /// Start playing the item at `index`
    fn play_at(&self, index: usize);

    /// Jump to the item after `media_id`
    ///
    /// A no-op when the player is no longer on `media_id`, because it
    /// already moved on by itself.
    fn skip_from(&self, media_id: Uuid);

    fn stop(&self);

    /// Pause if playing, resume if paused
    fn toggle_pause(&self);

    /// Elapsed time of the current item (zero when idle)
    fn elapsed(&self) -> Duration;

    /// Duration of the current item (zero when idle)
    fn duration(&self) -> Duration;

    fn progress(&self) -> Progress {
        Progress {
            elapsed: self.elapsed(),
            duration: self.duration(),
        }
    }
}

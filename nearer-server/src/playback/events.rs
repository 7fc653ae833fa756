//! Outbound event boundary
//!
//! The queue manager hands finished events to a `Broadcaster` after releasing
//! its lock. Optional hooks let the host observe track ends and status
//! changes without subscribing to the event stream.

use nearer_common::events::{EndedMessage, StatusMessage};
use nearer_common::NearerEvent;
use std::sync::Arc;
use uuid::Uuid;

/// Delivers events to connected sessions
pub trait Broadcaster: Send + Sync {
    /// Deliver to every connected session
    fn publish(&self, event: NearerEvent);

    /// Deliver to one session only
    fn publish_to(&self, session_id: Uuid, event: NearerEvent);
}

pub type SongEndHook = Arc<dyn Fn(&EndedMessage) + Send + Sync>;
pub type StatusHook = Arc<dyn Fn(&StatusMessage) + Send + Sync>;

/// Externally supplied callbacks, invoked outside the queue lock
#[derive(Clone, Default)]
pub struct QueueHooks {
    /// Called after a track finished naturally and `ended` was published
    pub on_song_end: Option<SongEndHook>,
    /// Called after the player confirmed a play/pause and `status` was published
    pub on_status_change: Option<StatusHook>,
}

impl QueueHooks {
    pub fn on_song_end(mut self, hook: impl Fn(&EndedMessage) + Send + Sync + 'static) -> Self {
        self.on_song_end = Some(Arc::new(hook));
        self
    }

    pub fn on_status_change(
        mut self,
        hook: impl Fn(&StatusMessage) + Send + Sync + 'static,
    ) -> Self {
        self.on_status_change = Some(Arc::new(hook));
        self
    }

    pub(crate) fn song_ended(&self, msg: &EndedMessage) {
        if let Some(hook) = &self.on_song_end {
            hook(msg);
        }
    }

    pub(crate) fn status_changed(&self, msg: &StatusMessage) {
        if let Some(hook) = &self.on_status_change {
            hook(msg);
        }
    }
}

impl std::fmt::Debug for QueueHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueHooks")
            .field("on_song_end", &self.on_song_end.is_some())
            .field("on_status_change", &self.on_status_change.is_some())
            .finish()
    }
}

//! Playback core
//!
//! Queue, status machine and the manager that ties them to a native player.

pub mod events;
pub mod player;
pub mod progress;
pub mod queue;
pub mod queue_manager;
pub mod simulated;
pub mod status;

pub use events::{Broadcaster, QueueHooks};
pub use player::{
    notification_channel, MediaSource, NativePlayer, NotificationReceiver, NotificationSender,
    PlayerNotification, Progress,
};
pub use progress::spawn_progress_ticker;
pub use queue::{TrackQueue, DEFAULT_MAX_HISTORY};
pub use queue_manager::{QueueManager, QueueOptions};
pub use simulated::SimulatedPlayer;
pub use status::{StatusEvent, StatusMachine};

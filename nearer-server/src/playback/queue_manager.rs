//! Queue manager
//!
//! Owns the track queue, cursor and playback status under one lock, and
//! turns client commands and player notifications into state transitions and
//! outbound events.
//!
//! **Locking discipline:**
//! - Resolution, probing and retries run before the lock is taken
//! - Only simple player commands (set_playlist, play_at, append, skip_from, stop)
//!   are issued while the lock is held; their notifications come back later
//!   on the player's thread
//! - Events are built under the lock and published after it is released
//! - Hooks run after publishing, outside the lock

use super::events::{Broadcaster, QueueHooks};
use super::player::{MediaSource, NativePlayer, PlayerNotification, Progress};
use super::queue::{TrackQueue, DEFAULT_MAX_HISTORY};
use super::status::{StatusEvent, StatusMachine};
use crate::error::{Error, Result};
use crate::resolver::MediaResolver;
use crate::retry::{retry_resolution, RetryPolicy};
use chrono::Utc;
use nearer_common::events::{
    wire_index, AddedMessage, EndedMessage, InitMessage, StatusMessage,
};
use nearer_common::{NearerEvent, PlaybackStatus, Track};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tunables for a `QueueManager`
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub max_history: usize,
    pub retry: RetryPolicy,
    pub hooks: QueueHooks,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            retry: RetryPolicy::default(),
            hooks: QueueHooks::default(),
        }
    }
}

/// Everything guarded by the queue lock
#[derive(Debug)]
struct QueueState {
    queue: TrackQueue,
    status: StatusMachine,
    /// Sequence number of the last event built
    seq: u64,
}

impl QueueState {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn ended_message(&mut self, exhausted: bool) -> EndedMessage {
        let status = self.status.apply(StatusEvent::Advanced { exhausted });
        EndedMessage {
            seq: self.next_seq(),
            status,
            current_song_idx: wire_index(self.queue.cursor()),
        }
    }
}

/// Shared playback queue
///
/// One instance per native player, shared by `Arc` between the HTTP
/// handlers, the notification pump and the progress ticker.
pub struct QueueManager {
    state: Mutex<QueueState>,
    /// Held from just before the state lock is released until the event is
    /// published, so events leave in `seq` order
    publish_order: Mutex<()>,
    player: Arc<dyn NativePlayer>,
    resolver: Arc<dyn MediaResolver>,
    broadcaster: Arc<dyn Broadcaster>,
    retry: RetryPolicy,
    hooks: QueueHooks,
}

impl QueueManager {
    pub fn new(
        player: Arc<dyn NativePlayer>,
        resolver: Arc<dyn MediaResolver>,
        broadcaster: Arc<dyn Broadcaster>,
        options: QueueOptions,
    ) -> Self {
        Self {
            state: Mutex::new(QueueState {
                queue: TrackQueue::new(options.max_history),
                status: StatusMachine::new(),
                seq: 0,
            }),
            publish_order: Mutex::new(()),
            player,
            resolver,
            broadcaster,
            retry: options.retry,
            hooks: options.hooks,
        }
    }

    /// Take the publish-order lock while still holding the state lock, then
    /// release the state lock
    async fn hand_over<'a>(&'a self, state: MutexGuard<'a, QueueState>) -> MutexGuard<'a, ()> {
        let order = self.publish_order.lock().await;
        drop(state);
        order
    }

    /// Resolve `track_ref` and add it to the head of the queue
    ///
    /// Nothing is mutated unless resolution and probing succeed. If the queue
    /// was exhausted the player is given a fresh list with just this track and
    /// told to play it; otherwise the track is appended behind whatever is
    /// playing.
    ///
    /// # Errors
    /// * `Error::BadRequest` - empty reference
    /// * `Error::Resolution` - the reference names nothing playable
    /// * `Error::StreamUnavailable` - every retry attempt failed transiently
    pub async fn add(&self, requester: &str, track_ref: &str) -> Result<Track> {
        let track_ref = track_ref.trim();
        if track_ref.is_empty() {
            return Err(Error::BadRequest("track reference is empty".to_string()));
        }

        let resolver = &self.resolver;
        let media = retry_resolution(&self.retry, track_ref, || async move {
            let media = resolver.resolve(track_ref).await?;
            resolver.probe(&media.url).await?;
            Ok(media)
        })
        .await?;

        let track = Track {
            id: Uuid::new_v4(),
            added_by: requester.to_string(),
            track_ref: track_ref.to_string(),
            url: media.url,
            title: media.title,
            duration: media.duration,
            thumb: media.thumb,
            thumb_big: media.thumb_big,
            added_at: Utc::now(),
        };

        let mut state = self.state.lock().await;
        let source = MediaSource::from(&track);
        if state.queue.is_exhausted() {
            self.player.set_playlist(vec![source]);
            self.player.play_at(0);
            state.status.apply(StatusEvent::Enqueued);
        } else {
            self.player.append(source);
        }
        let cursor = state.queue.push(track.clone());
        let message = AddedMessage {
            seq: state.next_seq(),
            status: state.status.current(),
            song: track.clone(),
            current_song_idx: wire_index(Some(cursor)),
        };
        debug!(
            tracks = state.queue.len(),
            played = state.queue.played(),
            queue = %state.queue.render(),
            "Queue after add"
        );

        let _order = self.hand_over(state).await;
        info!(
            requester,
            track_ref,
            title = %track.title,
            cursor,
            "Track added"
        );
        self.broadcaster.publish(NearerEvent::Added(message));

        Ok(track)
    }

    /// Skip the current track
    ///
    /// Returns false without touching anything (and without publishing) when
    /// the queue is already exhausted.
    ///
    /// The player is told which item is being skipped. If it already finished
    /// that item on its own, the skip lands on the track it moved to and the
    /// pending end notification is dropped as stale.
    pub async fn skip(&self, requester: &str) -> bool {
        let mut state = self.state.lock().await;
        let Some(skipped) = state.queue.current().map(|t| t.id) else {
            debug!(requester, empty = state.queue.is_empty(), "Skip ignored, nothing playing");
            return false;
        };
        state.queue.advance();

        let exhausted = state.queue.is_exhausted();
        if exhausted {
            self.player.stop();
        } else {
            self.player.skip_from(skipped);
        }
        let message = state.ended_message(exhausted);
        debug!(
            tracks = state.queue.len(),
            played = state.queue.played(),
            queue = %state.queue.render(),
            "Queue after skip"
        );

        let _order = self.hand_over(state).await;
        info!(requester, cursor = message.current_song_idx, "Track skipped");
        self.broadcaster.publish(NearerEvent::Ended(message));
        true
    }

    /// Ask the player to pause or resume
    ///
    /// Status follows later, from the player's own notification.
    pub fn toggle_pause(&self, requester: &str) {
        info!(requester, "Pause toggled");
        self.player.toggle_pause();
    }

    /// Player finished `media_id` on its own
    ///
    /// Notifications for anything but the current track are stale (the
    /// track was already skipped) and ignored.
    pub async fn on_track_ended(&self, media_id: Uuid) {
        let mut state = self.state.lock().await;
        match state.queue.current() {
            Some(current) if current.id == media_id => {}
            _ => {
                debug!(%media_id, "Ignoring end of a track that is no longer current");
                return;
            }
        }

        state.queue.advance();
        let exhausted = state.queue.is_exhausted();
        let message = state.ended_message(exhausted);
        debug!(
            tracks = state.queue.len(),
            played = state.queue.played(),
            queue = %state.queue.render(),
            "Queue after track end"
        );

        let order = self.hand_over(state).await;
        self.broadcaster.publish(NearerEvent::Ended(message.clone()));
        drop(order);

        self.hooks.song_ended(&message);
    }

    pub async fn on_playback_started(&self, media_id: Uuid) {
        self.apply_native(media_id, StatusEvent::NativeStarted).await;
    }

    pub async fn on_playback_paused(&self, media_id: Uuid) {
        self.apply_native(media_id, StatusEvent::NativePaused).await;
    }

    /// Apply a player-reported status
    ///
    /// Reports naming a different track than the current one are stale. With
    /// no current track the report is still applied, since the player is
    /// authoritative about what it is doing.
    async fn apply_native(&self, media_id: Uuid, event: StatusEvent) {
        let progress = self.player.progress();

        let mut state = self.state.lock().await;
        if let Some(current) = state.queue.current() {
            if current.id != media_id {
                debug!(%media_id, ?event, "Ignoring status report for a track that is no longer current");
                return;
            }
        }
        let status = state.status.apply(event);
        let message = StatusMessage {
            seq: state.next_seq(),
            status,
            time: progress.elapsed_ms(),
            length: progress.duration_ms(),
        };

        let order = self.hand_over(state).await;
        self.broadcaster.publish(NearerEvent::Status(message.clone()));
        drop(order);

        self.hooks.status_changed(&message);
    }

    /// Publish a `status` progress update if something is playing
    ///
    /// Returns whether an event was published.
    pub async fn publish_progress(&self) -> bool {
        let progress = self.player.progress();

        let mut state = self.state.lock().await;
        let status = state.status.current();
        if status != PlaybackStatus::Playing {
            return false;
        }
        let message = StatusMessage {
            seq: state.next_seq(),
            status,
            time: progress.elapsed_ms(),
            length: progress.duration_ms(),
        };

        let _order = self.hand_over(state).await;
        self.broadcaster.publish(NearerEvent::Status(message));
        true
    }

    /// Elapsed time and duration of the current media item
    pub fn query_progress(&self) -> Progress {
        self.player.progress()
    }

    pub async fn status(&self) -> PlaybackStatus {
        self.state.lock().await.status.current()
    }

    /// Full snapshot for a newly connected client
    ///
    /// `seq` is that of the last event reflected in the snapshot; later
    /// events carry larger numbers.
    pub async fn init_snapshot(&self) -> InitMessage {
        let progress = self.player.progress();

        let state = self.state.lock().await;
        let status = state.status.current();
        let (time, length) = if status.is_active() {
            (progress.elapsed_ms(), progress.duration_ms())
        } else {
            (0, 0)
        };
        InitMessage {
            seq: state.seq,
            status,
            songs: state.queue.snapshot(),
            current_song_idx: wire_index(state.queue.cursor()),
            time,
            length,
        }
    }

    /// Route one player notification to its handler
    pub async fn handle_notification(&self, notification: PlayerNotification) {
        match notification {
            PlayerNotification::TrackEnded { media_id } => self.on_track_ended(media_id).await,
            PlayerNotification::PlaybackStarted { media_id } => {
                self.on_playback_started(media_id).await
            }
            PlayerNotification::PlaybackPaused { media_id } => {
                self.on_playback_paused(media_id).await
            }
        }
    }

    /// Drain player notifications until every sender is gone
    ///
    /// The only consumer of the player's channel, so notifications are
    /// handled one at a time in the order the player raised them.
    pub async fn run_notifications(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<PlayerNotification>,
    ) {
        info!("Player notification pump started");
        while let Some(notification) = rx.recv().await {
            debug!(?notification, "Player notification");
            self.handle_notification(notification).await;
        }
        warn!("Player notification channel closed, pump exiting");
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("retry", &self.retry)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

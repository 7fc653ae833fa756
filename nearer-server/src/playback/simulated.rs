//! Simulated native player
//!
//! Walks its media list in real time on a dedicated `player-events` thread,
//! honouring each item's duration, pause and stop. Command calls only update
//! shared state and wake the thread; every notification is sent from that
//! thread, never from inside a command call.

use super::player::{MediaSource, NativePlayer, NotificationSender, PlayerNotification};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
enum Transport {
    Idle,
    Playing { started: Instant, offset: Duration },
    Paused { at: Duration },
}

#[derive(Debug)]
struct Inner {
    items: Vec<MediaSource>,
    index: Option<usize>,
    transport: Transport,
    /// Playback stopped because the list ended (not because of `stop`)
    ran_off_end: bool,
    outbox: VecDeque<PlayerNotification>,
    shutdown: bool,
}

impl Inner {
    fn current(&self) -> Option<&MediaSource> {
        self.index.and_then(|i| self.items.get(i))
    }

    fn start(&mut self, index: usize) {
        let Some(item) = self.items.get(index) else {
            warn!(index, len = self.items.len(), "Play index out of range");
            return;
        };
        let media_id = item.id;
        self.index = Some(index);
        self.transport = Transport::Playing {
            started: Instant::now(),
            offset: Duration::ZERO,
        };
        self.ran_off_end = false;
        self.outbox
            .push_back(PlayerNotification::PlaybackStarted { media_id });
    }

    fn go_idle(&mut self, ran_off_end: bool) {
        self.index = None;
        self.transport = Transport::Idle;
        self.ran_off_end = ran_off_end;
    }

    fn elapsed(&self) -> Duration {
        let elapsed = match self.transport {
            Transport::Idle => Duration::ZERO,
            Transport::Playing { started, offset } => offset + started.elapsed(),
            Transport::Paused { at } => at,
        };
        let duration = self.current().map_or(Duration::ZERO, |m| m.duration);
        elapsed.min(duration)
    }

    /// Time until the current item ends, if it is playing
    fn remaining(&self) -> Option<Duration> {
        match self.transport {
            Transport::Playing { started, offset } => {
                let duration = self.current().map_or(Duration::ZERO, |m| m.duration);
                Some(duration.saturating_sub(offset + started.elapsed()))
            }
            _ => None,
        }
    }

    fn finish_current(&mut self) {
        let Some(index) = self.index else {
            return;
        };
        if let Some(item) = self.items.get(index) {
            self.outbox
                .push_back(PlayerNotification::TrackEnded { media_id: item.id });
        }
        if index + 1 < self.items.len() {
            self.start(index + 1);
        } else {
            self.go_idle(true);
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate state, then wake the player thread
    fn command<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let result = f(&mut self.lock());
        self.wake.notify_one();
        result
    }
}

/// Real-time stand-in for an audio engine
pub struct SimulatedPlayer {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedPlayer {
    /// Start the player thread; notifications go to `notifications`
    pub fn spawn(notifications: NotificationSender) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                items: Vec::new(),
                index: None,
                transport: Transport::Idle,
                ran_off_end: false,
                outbox: VecDeque::new(),
                shutdown: false,
            }),
            wake: Condvar::new(),
        });

        let thread_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("player-events".to_string())
            .spawn(move || run_player_thread(&thread_shared, &notifications))?;

        info!("Simulated player started");
        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }
}

fn run_player_thread(shared: &Shared, notifications: &NotificationSender) {
    let mut inner = shared.lock();
    loop {
        if inner.shutdown {
            break;
        }

        while let Some(notification) = inner.outbox.pop_front() {
            if notifications.send(notification).is_err() {
                debug!(?notification, "No notification receiver, dropping");
            }
        }

        match inner.remaining() {
            Some(remaining) if remaining.is_zero() => inner.finish_current(),
            Some(remaining) => {
                inner = shared
                    .wake
                    .wait_timeout(inner, remaining)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            None => {
                inner = shared
                    .wake
                    .wait(inner)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
    }
    debug!("Player thread exiting");
}

impl NativePlayer for SimulatedPlayer {
    fn set_playlist(&self, items: Vec<MediaSource>) {
        self.shared.command(|inner| {
            inner.items = items;
            inner.go_idle(false);
        });
    }

    fn append(&self, item: MediaSource) {
        self.shared.command(|inner| {
            inner.items.push(item);
            if inner.ran_off_end {
                inner.start(inner.items.len() - 1);
            }
        });
    }

    fn play_at(&self, index: usize) {
        self.shared.command(|inner| inner.start(index));
    }

    fn skip_from(&self, media_id: Uuid) {
        self.shared.command(|inner| {
            let Some(index) = inner.index else {
                debug!(%media_id, "Skip while idle, nothing to do");
                return;
            };
            if inner.items.get(index).map(|m| m.id) != Some(media_id) {
                debug!(%media_id, "Already moved past skipped item");
                return;
            }
            if index + 1 < inner.items.len() {
                inner.start(index + 1);
            } else {
                inner.go_idle(true);
            }
        });
    }

    fn stop(&self) {
        self.shared.command(|inner| inner.go_idle(false));
    }

    fn toggle_pause(&self) {
        self.shared.command(|inner| {
            let Some(media_id) = inner.current().map(|m| m.id) else {
                return;
            };
            match inner.transport {
                Transport::Playing { .. } => {
                    inner.transport = Transport::Paused {
                        at: inner.elapsed(),
                    };
                    inner
                        .outbox
                        .push_back(PlayerNotification::PlaybackPaused { media_id });
                }
                Transport::Paused { at } => {
                    inner.transport = Transport::Playing {
                        started: Instant::now(),
                        offset: at,
                    };
                    inner
                        .outbox
                        .push_back(PlayerNotification::PlaybackStarted { media_id });
                }
                Transport::Idle => {}
            }
        });
    }

    fn elapsed(&self) -> Duration {
        self.shared.lock().elapsed()
    }

    fn duration(&self) -> Duration {
        let inner = self.shared.lock();
        match inner.transport {
            Transport::Idle => Duration::ZERO,
            _ => inner.current().map_or(Duration::ZERO, |m| m.duration),
        }
    }
}

impl Drop for SimulatedPlayer {
    fn drop(&mut self) {
        self.shared.command(|inner| inner.shutdown = true);
        let worker = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                warn!("Player thread panicked");
            }
        }
    }
}

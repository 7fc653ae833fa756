//! Shared test doubles for nearer-server integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use nearer_common::NearerEvent;
use nearer_server::playback::{
    Broadcaster, MediaSource, NativePlayer, QueueManager, QueueOptions,
};
use nearer_server::resolver::{MediaResolver, ResolveError, ResolvedMedia};
use nearer_server::retry::RetryPolicy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// What the scripted resolver does for one reference
#[derive(Debug, Clone)]
enum Script {
    Ok(ResolvedMedia),
    /// Fail transiently this many more times, then succeed
    Flaky(u32, ResolvedMedia),
    AlwaysTransient,
}

/// Resolver driven by a fixed script; unknown references are unresolvable
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicU32,
}

pub fn media_for(key: &str) -> ResolvedMedia {
    ResolvedMedia {
        url: format!("http://media.test/{}.opus", key),
        title: key.to_uppercase(),
        duration: 180,
        thumb: format!("http://img.test/{}.jpg", key),
        thumb_big: format!("http://img.test/{}-big.jpg", key),
    }
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(self, key: &str) -> Self {
        self.script(key, Script::Ok(media_for(key)))
    }

    pub fn with_media(self, key: &str, media: ResolvedMedia) -> Self {
        self.script(key, Script::Ok(media))
    }

    pub fn flaky(self, key: &str, failures: u32) -> Self {
        self.script(key, Script::Flaky(failures, media_for(key)))
    }

    pub fn broken(self, key: &str) -> Self {
        self.script(key, Script::AlwaysTransient)
    }

    fn script(self, key: &str, script: Script) -> Self {
        self.scripts.lock().unwrap().insert(key.to_string(), script);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaResolver for ScriptedResolver {
    async fn resolve(&self, track_ref: &str) -> Result<ResolvedMedia, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(track_ref) {
            None => Err(ResolveError::Unresolvable(format!("no such track '{}'", track_ref))),
            Some(Script::Ok(media)) => Ok(media.clone()),
            Some(Script::Flaky(remaining, media)) => {
                if *remaining == 0 {
                    Ok(media.clone())
                } else {
                    *remaining -= 1;
                    Err(ResolveError::Transient("upstream 503".to_string()))
                }
            }
            Some(Script::AlwaysTransient) => {
                Err(ResolveError::Transient("stream probe failed".to_string()))
            }
        }
    }
}

/// Calls received by the recording player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCall {
    SetPlaylist(Vec<Uuid>),
    Append(Uuid),
    PlayAt(usize),
    SkipFrom(Uuid),
    Stop,
    TogglePause,
}

/// Native player that only records what it was told
#[derive(Debug)]
pub struct RecordingPlayer {
    calls: Mutex<Vec<PlayerCall>>,
    elapsed: Duration,
    duration: Duration,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            elapsed: Duration::from_millis(1500),
            duration: Duration::from_secs(180),
        }
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: PlayerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl NativePlayer for RecordingPlayer {
    fn set_playlist(&self, items: Vec<MediaSource>) {
        self.record(PlayerCall::SetPlaylist(items.iter().map(|m| m.id).collect()));
    }

    fn append(&self, item: MediaSource) {
        self.record(PlayerCall::Append(item.id));
    }

    fn play_at(&self, index: usize) {
        self.record(PlayerCall::PlayAt(index));
    }

    fn skip_from(&self, media_id: Uuid) {
        self.record(PlayerCall::SkipFrom(media_id));
    }

    fn stop(&self) {
        self.record(PlayerCall::Stop);
    }

    fn toggle_pause(&self) {
        self.record(PlayerCall::TogglePause);
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

/// Broadcaster that keeps every published event, with its recipient
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    events: Mutex<Vec<(Option<Uuid>, NearerEvent)>>,
}

impl RecordingBroadcaster {
    pub fn events(&self) -> Vec<NearerEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name()).collect()
    }

    pub fn last(&self) -> Option<NearerEvent> {
        self.events().pop()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish(&self, event: NearerEvent) {
        self.events.lock().unwrap().push((None, event));
    }

    fn publish_to(&self, session_id: Uuid, event: NearerEvent) {
        self.events.lock().unwrap().push((Some(session_id), event));
    }
}

/// Manager wired to recording doubles
pub struct Harness {
    pub manager: Arc<QueueManager>,
    pub player: Arc<RecordingPlayer>,
    pub broadcaster: Arc<RecordingBroadcaster>,
    pub resolver: Arc<ScriptedResolver>,
}

pub fn harness(resolver: ScriptedResolver) -> Harness {
    harness_with(resolver, QueueOptions::default())
}

pub fn harness_with(resolver: ScriptedResolver, mut options: QueueOptions) -> Harness {
    // No sleeping between attempts in tests
    options.retry = RetryPolicy::immediate(options.retry.max_attempts);

    let player = Arc::new(RecordingPlayer::new());
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    let resolver = Arc::new(resolver);
    let manager = Arc::new(QueueManager::new(
        Arc::clone(&player) as Arc<dyn NativePlayer>,
        Arc::clone(&resolver) as Arc<dyn MediaResolver>,
        Arc::clone(&broadcaster) as Arc<dyn Broadcaster>,
        options,
    ));
    Harness {
        manager,
        player,
        broadcaster,
        resolver,
    }
}

/// Resolver knowing `track-0` .. `track-{n-1}`
pub fn numbered_tracks(n: usize) -> ScriptedResolver {
    (0..n).fold(ScriptedResolver::new(), |r, i| r.with_track(&format!("track-{}", i)))
}

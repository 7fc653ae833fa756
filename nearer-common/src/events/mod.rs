//! Event types for the Nearer event system
//!
//! Provides the wire events every client observes, plus the `EventBus` the
//! server uses to fan them out.
//!
//! # Wire format
//!
//! Each event travels as a name plus a JSON payload, e.g. SSE
//! `event: added` / `data: {"seq":4,"status":"buffering",...}`.
//! Queue positions are sent as `current_song_idx`, where `-1` means no track
//! is current.

mod status;
mod track;

pub use status::PlaybackStatus;
pub use track::{render_queue, Track};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Converts an optional queue position to its wire form (`-1` for none)
pub fn wire_index(cursor: Option<usize>) -> i64 {
    cursor.map(|c| c as i64).unwrap_or(-1)
}

/// Converts a wire queue position back to an optional index
pub fn index_from_wire(idx: i64) -> Option<usize> {
    usize::try_from(idx).ok()
}

/// Tells a freshly connected client which session id to issue commands with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionMessage {
    pub session_id: Uuid,
}

/// Full queue snapshot, sent only to a newly connected session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitMessage {
    /// Sequence number of the last event folded into this snapshot
    pub seq: u64,
    pub status: PlaybackStatus,
    /// Newest first
    pub songs: Vec<Track>,
    pub current_song_idx: i64,
    /// Elapsed time of the current track (milliseconds)
    pub time: u64,
    /// Duration of the current track (milliseconds)
    pub length: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddedMessage {
    pub seq: u64,
    pub status: PlaybackStatus,
    pub song: Track,
    pub current_song_idx: i64,
}

/// Track ended or was skipped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndedMessage {
    pub seq: u64,
    pub status: PlaybackStatus,
    pub current_song_idx: i64,
}

/// Status change or periodic progress update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusMessage {
    pub seq: u64,
    pub status: PlaybackStatus,
    pub time: u64,
    pub length: u64,
}

/// Nearer event types
///
/// Serialized adjacently tagged so the same value can be split into an SSE
/// event name and data payload, and rebuilt on the client side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum NearerEvent {
    Session(SessionMessage),
    Init(InitMessage),
    Added(AddedMessage),
    Ended(EndedMessage),
    Status(StatusMessage),
}

impl NearerEvent {
    /// Event name as used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            NearerEvent::Session(_) => "session",
            NearerEvent::Init(_) => "init",
            NearerEvent::Added(_) => "added",
            NearerEvent::Ended(_) => "ended",
            NearerEvent::Status(_) => "status",
        }
    }

    /// Sequence number, if this event describes queue state
    pub fn seq(&self) -> Option<u64> {
        match self {
            NearerEvent::Session(_) => None,
            NearerEvent::Init(m) => Some(m.seq),
            NearerEvent::Added(m) => Some(m.seq),
            NearerEvent::Ended(m) => Some(m.seq),
            NearerEvent::Status(m) => Some(m.seq),
        }
    }

    /// Serializes only the payload half of the event
    pub fn payload_json(&self) -> serde_json::Result<String> {
        match self {
            NearerEvent::Session(m) => serde_json::to_string(m),
            NearerEvent::Init(m) => serde_json::to_string(m),
            NearerEvent::Added(m) => serde_json::to_string(m),
            NearerEvent::Ended(m) => serde_json::to_string(m),
            NearerEvent::Status(m) => serde_json::to_string(m),
        }
    }

    /// Rebuilds an event from a wire name and JSON payload
    pub fn from_parts(name: &str, data: &str) -> crate::Result<Self> {
        let data: serde_json::Value = serde_json::from_str(data)?;
        let tagged = serde_json::json!({ "event": name, "data": data });
        Ok(serde_json::from_value(tagged)?)
    }
}

/// An event plus its audience: every session, or exactly one
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    /// `None` broadcasts to every session
    pub recipient: Option<Uuid>,
    pub event: NearerEvent,
}

impl EventEnvelope {
    pub fn broadcast(event: NearerEvent) -> Self {
        Self {
            recipient: None,
            event,
        }
    }

    pub fn to_session(session_id: Uuid, event: NearerEvent) -> Self {
        Self {
            recipient: Some(session_id),
            event,
        }
    }

    /// Whether the given session should receive this envelope
    pub fn is_for(&self, session_id: Uuid) -> bool {
        self.recipient.map_or(true, |r| r == session_id)
    }
}

/// Event distribution bus
///
/// Thin wrapper over `tokio::sync::broadcast`. Each connected client holds
/// one receiver; lagging receivers lose the oldest events.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use nearer_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        envelope: EventEnvelope,
    ) -> Result<usize, broadcast::error::SendError<EventEnvelope>> {
        self.tx.send(envelope)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

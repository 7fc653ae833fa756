//! SSE broadcaster for real-time client updates

use crate::playback::Broadcaster;
use nearer_common::events::{EventBus, EventEnvelope};
use nearer_common::NearerEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

/// Fans queue events out to every open SSE stream
///
/// Each stream holds one receiver on the bus; events addressed to a single
/// session are filtered out by every other stream.
pub struct SseBroadcaster {
    bus: EventBus,
}

impl SseBroadcaster {
    /// Create a new SSE broadcaster
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events buffered per slow client before it lags
    pub fn new(capacity: usize) -> Self {
        info!("SSE broadcaster initialized with capacity {}", capacity);
        Self {
            bus: EventBus::new(capacity),
        }
    }

    /// Receiver for a new client; must be taken before its `init` snapshot
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.bus.subscribe()
    }

    /// Get current number of connected clients
    pub fn client_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    fn send(&self, envelope: EventEnvelope) {
        let name = envelope.event.name();
        match self.bus.emit(envelope) {
            Ok(count) => debug!(event = name, clients = count, "Broadcast event"),
            Err(_) => debug!(event = name, "No clients connected, event dropped"),
        }
    }
}

impl Broadcaster for SseBroadcaster {
    fn publish(&self, event: NearerEvent) {
        self.send(EventEnvelope::broadcast(event));
    }

    fn publish_to(&self, session_id: Uuid, event: NearerEvent) {
        self.send(EventEnvelope::to_session(session_id, event));
    }
}

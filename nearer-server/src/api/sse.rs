//! Server-Sent Events (SSE) stream
//!
//! Each connection is a session. The stream starts with `session` (the id
//! to post commands with) and `init` (full queue snapshot), then carries
//! every later event addressed to this session or to everyone.

use super::server::AppContext;
use crate::sessions::SessionGuard;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use nearer_common::events::SessionMessage;
use nearer_common::NearerEvent;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, warn};

/// GET /events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before taking the snapshot so nothing falls between them
    let rx = ctx.broadcaster.subscribe();
    let session_id = ctx.sessions.open();
    let guard = SessionGuard::new(Arc::clone(&ctx.sessions), session_id);

    let init = ctx.queue.init_snapshot().await;
    let snapshot_seq = init.seq;
    debug!(
        session_id = %session_id,
        seq = snapshot_seq,
        clients = ctx.broadcaster.client_count(),
        "New SSE client connected"
    );

    let preamble = stream::iter([
        NearerEvent::Session(SessionMessage { session_id }),
        NearerEvent::Init(init),
    ]);

    // The guard lives in this closure, so dropping the stream closes the session
    let live = BroadcastStream::new(rx).filter_map(move |result| {
        let event = match result {
            Ok(envelope) if envelope.is_for(guard.id()) => {
                // Already reflected in the init snapshot
                match envelope.event.seq() {
                    Some(seq) if seq <= snapshot_seq => None,
                    _ => Some(envelope.event),
                }
            }
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                // TODO: resync a lagged client with a fresh init snapshot
                warn!(session_id = %guard.id(), missed, "SSE client lagged, events dropped");
                None
            }
        };
        async move { event }
    });

    let stream = preamble
        .chain(live)
        .filter_map(|event| async move { to_sse_event(&event) })
        .map(Ok);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_sse_event(event: &NearerEvent) -> Option<Event> {
    match event.payload_json() {
        Ok(json) => Some(Event::default().event(event.name()).data(json)),
        Err(e) => {
            warn!(event = event.name(), "Failed to serialize event: {}", e);
            None
        }
    }
}

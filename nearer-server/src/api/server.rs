//! HTTP server setup and routing

use crate::error::{Error, Result};
use crate::playback::QueueManager;
use crate::sessions::SessionRegistry;
use crate::sse::SseBroadcaster;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub queue: Arc<QueueManager>,
    pub broadcaster: Arc<SseBroadcaster>,
    pub sessions: Arc<SessionRegistry>,
    /// Reject queue commands from sessions that never sent `user`
    pub require_identification: bool,
}

/// Build router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        .route("/build_info", get(super::handlers::build_info))
        .route("/queue", get(super::handlers::get_queue))
        .route("/progress", get(super::handlers::get_progress))
        .route("/events", get(super::sse::event_stream))
        .route(
            "/sessions/:session_id/commands",
            post(super::commands::post_command),
        )
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run HTTP API server until `shutdown` resolves
pub async fn run(
    ctx: AppContext,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(ctx);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}

//! Read-only HTTP handlers

use super::server::AppContext;
use axum::{extract::State, Json};
use nearer_common::events::InitMessage;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub sessions: usize,
}

/// Build information response
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
}

/// Elapsed time and duration of the current track, in milliseconds
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub time: u64,
    pub length: u64,
}

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "nearer-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: ctx.sessions.count(),
    })
}

/// GET /build_info
pub async fn build_info() -> Json<BuildInfo> {
    Json(BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
    })
}

/// GET /queue - same snapshot a new SSE client receives as `init`
pub async fn get_queue(State(ctx): State<AppContext>) -> Json<InitMessage> {
    Json(ctx.queue.init_snapshot().await)
}

/// GET /progress
pub async fn get_progress(State(ctx): State<AppContext>) -> Json<ProgressResponse> {
    let progress = ctx.queue.query_progress();
    Json(ProgressResponse {
        time: progress.elapsed_ms(),
        length: progress.duration_ms(),
    })
}

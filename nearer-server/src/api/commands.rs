//! Inbound client commands
//!
//! `POST /sessions/:id/commands` with `{"command": "add", "payload": "..."}`.
//! Commands the queue cannot act on (from an unidentified session, or `next`
//! with nothing playing) are no-ops answered with `202 {"status":"ignored"}`.

use super::error::ApiResult;
use super::server::AppContext;
use crate::error::{Error, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use nearer_common::Track;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Raw command body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// Parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bind a display name to the session
    User(String),
    /// Add a track reference to the queue
    Add(String),
    Next,
    Pause,
}

impl Command {
    pub fn parse(request: &CommandRequest) -> Result<Self> {
        match request.command.as_str() {
            "user" => text_payload(request).map(Command::User),
            "add" => text_payload(request).map(Command::Add),
            "next" => Ok(Command::Next),
            "pause" => Ok(Command::Pause),
            other => Err(Error::BadRequest(format!("unknown command '{}'", other))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::User(_) => "user",
            Command::Add(_) => "add",
            Command::Next => "next",
            Command::Pause => "pause",
        }
    }
}

/// Non-empty string payload
fn text_payload(request: &CommandRequest) -> Result<String> {
    match &request.payload {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(Error::BadRequest(format!(
            "'{}' needs a non-empty string payload",
            request.command
        ))),
    }
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// "ok" or "ignored"
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<Track>,
}

impl CommandResponse {
    fn ok() -> Self {
        Self {
            status: "ok",
            reason: None,
            song: None,
        }
    }

    fn ignored(reason: String) -> Self {
        Self {
            status: "ignored",
            reason: Some(reason),
            song: None,
        }
    }
}

/// POST /sessions/:id/commands
pub async fn post_command(
    State(ctx): State<AppContext>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CommandRequest>,
) -> ApiResult<(StatusCode, Json<CommandResponse>)> {
    if !ctx.sessions.contains(session_id) {
        return Err(Error::UnknownSession(session_id).into());
    }
    let command = Command::parse(&request)?;
    let name = command.name();

    match dispatch(&ctx, session_id, command).await {
        Ok(response) => Ok((StatusCode::OK, Json(response))),
        Err(Error::InvalidCommand(reason)) => {
            warn!(session_id = %session_id, command = name, %reason, "Command ignored");
            Ok((StatusCode::ACCEPTED, Json(CommandResponse::ignored(reason))))
        }
        Err(err) => Err(err.into()),
    }
}

/// Execute a parsed command on behalf of a session
pub async fn dispatch(ctx: &AppContext, session_id: Uuid, command: Command) -> Result<CommandResponse> {
    match command {
        Command::User(name) => {
            if !ctx.sessions.identify(session_id, &name) {
                return Err(Error::UnknownSession(session_id));
            }
            Ok(CommandResponse::ok())
        }
        Command::Add(track_ref) => {
            let requester = requester_name(ctx, session_id)?;
            let track = ctx.queue.add(&requester, &track_ref).await?;
            Ok(CommandResponse {
                song: Some(track),
                ..CommandResponse::ok()
            })
        }
        Command::Next => {
            let requester = requester_name(ctx, session_id)?;
            if !ctx.queue.skip(&requester).await {
                return Err(Error::InvalidCommand("nothing is playing".to_string()));
            }
            Ok(CommandResponse::ok())
        }
        Command::Pause => {
            let requester = requester_name(ctx, session_id)?;
            ctx.queue.toggle_pause(&requester);
            Ok(CommandResponse::ok())
        }
    }
}

/// Name recorded against queue changes made by this session
///
/// Unidentified sessions get `InvalidCommand` when identification is
/// required, or a placeholder derived from the session id otherwise.
fn requester_name(ctx: &AppContext, session_id: Uuid) -> Result<String> {
    match ctx.sessions.display_name(session_id) {
        Some(name) => Ok(name),
        None if ctx.require_identification => Err(Error::InvalidCommand(
            "session has not identified itself (send 'user' first)".to_string(),
        )),
        None => Ok(guest_name(session_id)),
    }
}

/// Placeholder requester name: `guest-` plus the first 8 hex digits of the id
fn guest_name(session_id: Uuid) -> String {
    let prefix: String = session_id.simple().to_string().chars().take(8).collect();
    format!("guest-{}", prefix)
}

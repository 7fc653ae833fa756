//! HTTP API
//!
//! - `GET /events` - SSE stream; opens a session
//! - `POST /sessions/:id/commands` - `user`, `add`, `next`, `pause`
//! - `GET /queue`, `GET /progress`, `GET /health`, `GET /build_info`

pub mod commands;
pub mod error;
pub mod handlers;
pub mod server;
pub mod sse;

pub use error::{ApiError, ApiResult};
pub use server::{create_router, run, AppContext};

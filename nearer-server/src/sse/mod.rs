//! Server-sent event fan-out

pub mod broadcaster;

pub use broadcaster::SseBroadcaster;

//! Media resolution
//!
//! Turns a client-supplied track reference into a playable stream locator
//! plus display metadata, and probes that locator before it is queued.

pub mod catalog;
pub mod http;

pub use catalog::CatalogResolver;
pub use http::{HttpProbe, HttpResolver};

use crate::error::{Error, Result};
use async_trait::async_trait;
use nearer_common::config::{ResolverConfig, ResolverKind};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Resolver output
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolvedMedia {
    /// Playable stream locator
    pub url: String,
    pub title: String,
    /// Seconds
    pub duration: u64,
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub thumb_big: String,
}

/// Resolution failures, split by whether retrying can help
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The reference does not name anything playable; retrying will not help
    #[error("unresolvable: {0}")]
    Unresolvable(String),

    /// Upstream or stream failure that may clear up on its own
    #[error("transient failure: {0}")]
    Transient(String),
}

/// Resolves track references to playable media
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, track_ref: &str) -> std::result::Result<ResolvedMedia, ResolveError>;

    /// Check that a resolved locator is playable right now
    async fn probe(&self, _url: &str) -> std::result::Result<(), ResolveError> {
        Ok(())
    }
}

/// Build the resolver selected by configuration
pub fn build_resolver(config: &ResolverConfig) -> Result<Arc<dyn MediaResolver>> {
    let timeout = Duration::from_millis(config.timeout_ms);
    let probe = if config.probe {
        Some(HttpProbe::new(timeout)?)
    } else {
        None
    };

    match config.kind {
        ResolverKind::Catalog => {
            info!(
                entries = config.catalog.len(),
                probe = config.probe,
                "Using catalog resolver"
            );
            Ok(Arc::new(CatalogResolver::new(&config.catalog, probe)))
        }
        ResolverKind::Http => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                Error::Config("resolver.endpoint is required for the http resolver".to_string())
            })?;
            info!(endpoint, probe = config.probe, "Using HTTP resolver");
            Ok(Arc::new(HttpResolver::new(endpoint, timeout, probe)?))
        }
    }
}

//! Static catalog resolver
//!
//! Resolves references against a fixed table loaded from configuration.

use super::{HttpProbe, MediaResolver, ResolveError, ResolvedMedia};
use async_trait::async_trait;
use nearer_common::config::CatalogEntry;
use std::collections::HashMap;

pub struct CatalogResolver {
    entries: HashMap<String, ResolvedMedia>,
    probe: Option<HttpProbe>,
}

impl CatalogResolver {
    pub fn new(entries: &[CatalogEntry], probe: Option<HttpProbe>) -> Self {
        let entries = entries
            .iter()
            .map(|e| {
                (
                    e.key.clone(),
                    ResolvedMedia {
                        url: e.url.clone(),
                        title: e.title.clone(),
                        duration: e.duration,
                        thumb: e.thumb.clone(),
                        thumb_big: e.thumb_big.clone(),
                    },
                )
            })
            .collect();
        Self { entries, probe }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl MediaResolver for CatalogResolver {
    async fn resolve(&self, track_ref: &str) -> Result<ResolvedMedia, ResolveError> {
        self.entries
            .get(track_ref.trim())
            .cloned()
            .ok_or_else(|| ResolveError::Unresolvable(format!("no catalog entry '{}'", track_ref)))
    }

    async fn probe(&self, url: &str) -> Result<(), ResolveError> {
        match &self.probe {
            Some(probe) => probe.check(url).await,
            None => Ok(()),
        }
    }
}

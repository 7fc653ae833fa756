//! HTTP resolver and stream probe
//!
//! The resolver asks an external resolution service:
//! `GET {endpoint}/resolve?ref=<track_ref>` → `ResolvedMedia` JSON.
//! 4xx answers mean the reference is bad; 5xx answers and network errors
//! are transient.

use super::{MediaResolver, ResolveError, ResolvedMedia};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Checks that a stream locator answers a HEAD request
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    /// Probe `url`; locators that are not http(s) are assumed playable
    pub async fn check(&self, url: &str) -> std::result::Result<(), ResolveError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Ok(());
        }

        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| ResolveError::Transient(format!("probe of {} failed: {}", url, e)))?;

        let status = response.status();
        debug!(url, %status, "Probed stream");
        if status.is_success() {
            Ok(())
        } else {
            Err(ResolveError::Transient(format!(
                "probe of {} returned {}",
                url, status
            )))
        }
    }
}

/// Resolver backed by an external resolution service
pub struct HttpResolver {
    client: Client,
    resolve_url: String,
    probe: Option<HttpProbe>,
}

impl HttpResolver {
    pub fn new(endpoint: &str, timeout: Duration, probe: Option<HttpProbe>) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            resolve_url: format!("{}/resolve", endpoint.trim_end_matches('/')),
            probe,
        })
    }
}

/// Classify a non-success response from the resolution service
fn classify_status(status: StatusCode, track_ref: &str, body: &str) -> ResolveError {
    if status.is_client_error() {
        ResolveError::Unresolvable(format!("{} ({}): {}", track_ref, status, body.trim()))
    } else {
        ResolveError::Transient(format!("resolver returned {} for {}", status, track_ref))
    }
}

#[async_trait]
impl MediaResolver for HttpResolver {
    async fn resolve(&self, track_ref: &str) -> std::result::Result<ResolvedMedia, ResolveError> {
        let response = self
            .client
            .get(&self.resolve_url)
            .query(&[("ref", track_ref)])
            .send()
            .await
            .map_err(|e| ResolveError::Transient(format!("resolver unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, track_ref, &body));
        }

        response
            .json::<ResolvedMedia>()
            .await
            .map_err(|e| ResolveError::Transient(format!("malformed resolver response: {}", e)))
    }

    async fn probe(&self, url: &str) -> std::result::Result<(), ResolveError> {
        match &self.probe {
            Some(probe) => probe.check(url).await,
            None => Ok(()),
        }
    }
}

//! HTTP client for a Nearer server

use anyhow::{bail, Context, Result};
use nearer_common::events::InitMessage;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Server answer to a command
#[derive(Debug, Deserialize)]
pub struct CommandReply {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Open the event stream; the first event names our session
    pub async fn open_events(&self) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(format!("{}/events", self.base))
            .header("accept", "text/event-stream")
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.base))?;
        if !response.status().is_success() {
            bail!("Event stream refused: HTTP {}", response.status());
        }
        Ok(response)
    }

    pub async fn command(&self, session: Uuid, name: &str, payload: Option<&str>) -> Result<CommandReply> {
        let response = self
            .http
            .post(format!("{}/sessions/{}/commands", self.base, session))
            .json(&json!({ "command": name, "payload": payload }))
            .send()
            .await
            .context("Failed to send command")?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.context("Malformed command reply");
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string());
        bail!("{}", message)
    }

    pub async fn queue(&self) -> Result<InitMessage> {
        self.http
            .get(format!("{}/queue", self.base))
            .send()
            .await
            .context("Failed to fetch queue")?
            .error_for_status()?
            .json()
            .await
            .context("Malformed queue snapshot")
    }
}

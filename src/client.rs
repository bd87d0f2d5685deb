//! HTTP transport for the widgets.
//!
//! [`HttpBackend`] implements [`QueryBackend`] by POSTing `{"query": ...}`
//! to the configured endpoint (normally the proxy's `/api/chat`). Any
//! non-2xx status, network failure, or unparseable body is returned as a
//! [`BackendError`]; the dispatcher turns those into sentinel payloads.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use dockyard_assist_core::dispatch::{BackendError, QueryBackend};
use dockyard_assist_core::models::Query;

use crate::config::Config;

/// Sends queries to a JSON endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Backend for the configured client endpoint.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.client.endpoint.clone(), config.backend.timeout())
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    async fn ask(&self, query: &Query) -> std::result::Result<Value, BackendError> {
        debug!(endpoint = %self.endpoint, "POST query");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query.as_str() }))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(String::from));
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

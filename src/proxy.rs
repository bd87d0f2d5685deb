//! Chat proxy server.
//!
//! Sits between the widgets and the question-answering backend so browsers
//! only ever talk to one origin.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | Forward `{"query": ...}` to the backend's ask endpoint |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! On success the backend's JSON body is returned verbatim with status 200.
//! Any failure (unparseable request, unreachable backend, non-2xx upstream
//! status, non-JSON upstream body) returns status 500 with:
//!
//! ```json
//! { "error": "Failed to process your request" }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use crate::config::{BackendConfig, Config};

pub const PROXY_ERROR_MESSAGE: &str = "Failed to process your request";

/// Shared state passed to route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct ProxyState {
    client: reqwest::Client,
    /// Full URL of the backend's ask endpoint.
    upstream: Arc<str>,
}

/// Builds the proxy router for `backend`.
pub fn router(backend: &BackendConfig) -> Result<Router> {
    let client = reqwest::Client::builder()
        .timeout(backend.timeout())
        .build()
        .context("Failed to build upstream HTTP client")?;

    let state = ProxyState {
        client,
        upstream: Arc::from(backend.ask_url()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state))
}

/// Starts the proxy on `[proxy].bind` and serves until the process exits.
pub async fn run_proxy(config: &Config) -> Result<()> {
    let app = router(&config.backend)?;
    let bind_addr = &config.proxy.bind;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!(upstream = %config.backend.ask_url(), "proxy forwarding queries");
    println!("Proxy listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

/// Failure of any kind while proxying. Always rendered as the fixed 500 body.
struct ProxyError(anyhow::Error);

impl From<anyhow::Error> for ProxyError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error!(error = %format!("{:#}", self.0), "chat proxy request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": PROXY_ERROR_MESSAGE })),
        )
            .into_response()
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/chat ============

/// Handler for `POST /api/chat`.
///
/// Only the `query` field of the request is forwarded; anything else the
/// client sent is dropped. A request without `query` forwards `{}`; a
/// body that is not a JSON object fails.
async fn handle_chat(
    State(state): State<ProxyState>,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let request: Value = serde_json::from_slice(&body).context("Request body is not JSON")?;
    let Some(request) = request.as_object() else {
        return Err(anyhow::anyhow!("Request body is not a JSON object").into());
    };

    let mut forwarded = Map::new();
    if let Some(query) = request.get("query") {
        forwarded.insert("query".to_string(), query.clone());
    }

    debug!(upstream = %state.upstream, "forwarding query");
    let resp = state
        .client
        .post(&*state.upstream)
        .json(&forwarded)
        .send()
        .await
        .context("Backend unreachable")?;

    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("Backend returned HTTP {}", status).into());
    }

    let data: Value = resp
        .json()
        .await
        .context("Backend returned a non-JSON body")?;
    Ok(Json(data))
}

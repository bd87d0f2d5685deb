//! Query dispatch: one request per submitted query, with failures recovered
//! into sentinel payloads.
//!
//! The dispatcher never lets a transport failure escape. Which sentinel it
//! substitutes depends on the [`Surface`] it serves:
//!
//! | Surface | Failure payload |
//! |---------|-----------------|
//! | [`Surface::Chat`] | `{"explanation": CHAT_CONNECTIVITY_MESSAGE}` |
//! | [`Surface::Search`] | `{"error": SEARCH_FAILURE_MESSAGE}` |
//!
//! The chat panel shows the explanation as an ordinary AI reply; the search
//! overlay turns the `error` field into a blocking banner with a close
//! control.
//!
//! There is no cancellation. Concurrent submissions proceed independently
//! and the in-flight flag is cleared by whichever settles first.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Query, ResponsePayload};

pub const CHAT_CONNECTIVITY_MESSAGE: &str =
    "I'm sorry, I'm having trouble connecting to the AI service. Please try again later.";

pub const SEARCH_FAILURE_MESSAGE: &str = "Failed to get response. Please try again.";

/// Ways a backend round trip can fail.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status.
    #[error("backend returned HTTP {status}")]
    Status {
        status: u16,
        /// `message` field of the error body, if it had one.
        message: Option<String>,
    },

    /// The request never produced a response (connect, timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not valid JSON.
    #[error("malformed response body: {0}")]
    Decode(String),
}

/// Transport that carries `{"query": ...}` to the question-answering
/// service and returns its JSON body.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn ask(&self, query: &Query) -> Result<Value, BackendError>;
}

/// The presentation context a dispatcher serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The floating chatbot panel.
    Chat,
    /// The inline overlay beneath the hero search box.
    Search,
}

impl Surface {
    /// The sentinel payload substituted when a request fails.
    pub fn failure_payload(self) -> ResponsePayload {
        match self {
            Surface::Chat => ResponsePayload::explanation(CHAT_CONNECTIVITY_MESSAGE),
            Surface::Search => ResponsePayload::error(SEARCH_FAILURE_MESSAGE),
        }
    }
}

/// Sends queries through a [`QueryBackend`] and tracks whether a request
/// is outstanding.
pub struct QueryDispatcher<B> {
    backend: B,
    surface: Surface,
    in_flight: AtomicBool,
}

impl<B: QueryBackend> QueryDispatcher<B> {
    pub fn new(backend: B, surface: Surface) -> Self {
        Self {
            backend,
            surface,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// True while a request is outstanding.
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Validates `raw` and dispatches it.
    ///
    /// Returns `None` without touching the in-flight flag or the backend
    /// when `raw` is empty after trimming.
    pub async fn submit(&self, raw: &str) -> Option<ResponsePayload> {
        let query = Query::parse(raw)?;
        Some(self.dispatch(&query).await)
    }

    /// Issues exactly one backend request for `query`.
    ///
    /// Always resolves: a failed request yields the surface's sentinel
    /// payload. The in-flight flag is reset on every exit path, including
    /// the future being dropped mid-request.
    pub async fn dispatch(&self, query: &Query) -> ResponsePayload {
        let _flight = InFlight::start(&self.in_flight);
        debug!(query = %query, surface = ?self.surface, "dispatching query");

        match self.backend.ask(query).await {
            Ok(body) => ResponsePayload::new(body),
            Err(err) => {
                match &err {
                    BackendError::Status {
                        message: Some(detail),
                        ..
                    } => warn!(error = %err, %detail, "query failed"),
                    _ => warn!(error = %err, "query failed"),
                }
                self.surface.failure_payload()
            }
        }
    }
}

/// Holds the in-flight flag high until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Backend that records every query and replies with a canned result.
    struct FakeBackend {
        reply: Mutex<Option<Result<Value, BackendError>>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn replying(reply: Result<Value, BackendError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QueryBackend for FakeBackend {
        async fn ask(&self, query: &Query) -> Result<Value, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(query.as_str().to_string());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(json!({})))
        }
    }

    /// Backend that blocks until released, so tests can observe the flag.
    struct GatedBackend {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl QueryBackend for GatedBackend {
        async fn ask(&self, _query: &Query) -> Result<Value, BackendError> {
            self.entered.notify_one();
            self.release.notified().await;
            Err(BackendError::Transport("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_success_passes_body_through() {
        let body = json!({"results": [{"name": "Jane"}], "sql": "SELECT *"});
        let d = QueryDispatcher::new(FakeBackend::replying(Ok(body.clone())), Surface::Chat);
        let payload = d.submit("  who  ").await.unwrap();
        assert_eq!(payload.value(), &body);
        assert_eq!(d.backend().seen.lock().unwrap().as_slice(), ["who"]);
        assert!(!d.in_flight());
    }

    #[tokio::test]
    async fn test_blank_query_is_noop() {
        let d = QueryDispatcher::new(FakeBackend::replying(Ok(json!({}))), Surface::Search);
        assert!(d.submit("   ").await.is_none());
        assert!(d.submit("").await.is_none());
        assert_eq!(d.backend().calls.load(Ordering::SeqCst), 0);
        assert!(!d.in_flight());
    }

    #[tokio::test]
    async fn test_chat_failure_becomes_explanation() {
        let d = QueryDispatcher::new(
            FakeBackend::replying(Err(BackendError::Status {
                status: 502,
                message: Some("upstream down".into()),
            })),
            Surface::Chat,
        );
        let payload = d.submit("hello").await.unwrap();
        assert_eq!(payload.explanation_text(), Some(CHAT_CONNECTIVITY_MESSAGE));
        assert!(payload.error_value().is_none());
    }

    #[tokio::test]
    async fn test_search_failure_becomes_error() {
        let d = QueryDispatcher::new(
            FakeBackend::replying(Err(BackendError::Decode("eof".into()))),
            Surface::Search,
        );
        let payload = d.submit("hello").await.unwrap();
        assert_eq!(payload.error_value(), Some(&json!(SEARCH_FAILURE_MESSAGE)));
        assert!(payload.explanation_text().is_none());
    }

    #[tokio::test]
    async fn test_in_flight_toggles_once_even_on_failure() {
        let d = QueryDispatcher::new(
            GatedBackend {
                entered: Notify::new(),
                release: Notify::new(),
            },
            Surface::Chat,
        );
        assert!(!d.in_flight());

        let observe = async {
            d.backend().entered.notified().await;
            let during = d.in_flight();
            d.backend().release.notify_one();
            during
        };
        let (payload, during) = tokio::join!(d.submit("ping"), observe);

        assert!(during);
        assert!(!d.in_flight());
        assert_eq!(
            payload.unwrap().explanation_text(),
            Some(CHAT_CONNECTIVITY_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_dropped_request_clears_flag() {
        let d = QueryDispatcher::new(
            GatedBackend {
                entered: Notify::new(),
                release: Notify::new(),
            },
            Surface::Search,
        );
        let q = Query::parse("slow").unwrap();
        let res = tokio::time::timeout(std::time::Duration::from_millis(20), d.dispatch(&q)).await;
        assert!(res.is_err());
        assert!(!d.in_flight());
    }
}

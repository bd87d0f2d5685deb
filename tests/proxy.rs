//! End-to-end tests for the chat proxy and the HTTP backend.
//!
//! Each test starts an in-process mock of the question-answering service
//! on an ephemeral port, puts the real proxy router in front of it, and
//! talks to the proxy over HTTP.

use axum::{http::StatusCode, routing::post, Json, Router};
use dockyard_assist::client::HttpBackend;
use dockyard_assist::config::BackendConfig;
use dockyard_assist::conversation::{render_message, Conversation};
use dockyard_assist::dispatch::{
    BackendError, QueryBackend, QueryDispatcher, Surface, CHAT_CONNECTIVITY_MESSAGE,
    SEARCH_FAILURE_MESSAGE,
};
use dockyard_assist::models::{Query, Sender};
use dockyard_assist::proxy::{router, PROXY_ERROR_MESSAGE};
use dockyard_assist::render::{FieldLine, RecordBlock, RenderTree};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ─── Harness ────────────────────────────────────────────────────────

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Mock backend that records request bodies and replies with `reply`.
async fn spawn_upstream(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let app = Router::new().route(
        "/ask",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            let reply = reply.clone();
            async move {
                sink.lock().unwrap().push(body);
                (status, Json(reply))
            }
        }),
    );
    (spawn(app).await, seen)
}

async fn spawn_proxy(upstream_base: &str) -> String {
    let app = router(&BackendConfig {
        base_url: upstream_base.to_string(),
        ask_path: "/ask".to_string(),
        timeout_secs: 5,
    })
    .unwrap();
    spawn(app).await
}

fn mentor_reply() -> Value {
    json!({
        "results": [{"name": "Jane Doe", "focus_area": "SaaS"}],
        "explanation": "One mentor matched.",
        "sql": "SELECT name, focus_area FROM mentors"
    })
}

// ─── Proxy ──────────────────────────────────────────────────────────

#[tokio::test]
async fn proxy_passes_body_through_and_forwards_only_query() {
    let (upstream, seen) = spawn_upstream(StatusCode::OK, mentor_reply()).await;
    let proxy = spawn_proxy(&upstream).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/chat", proxy))
        .json(&json!({"query": "Find a mentor in tech", "session": "ignored"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, mentor_reply());
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        [json!({"query": "Find a mentor in tech"})]
    );
}

#[tokio::test]
async fn proxy_maps_upstream_error_to_500() {
    let (upstream, _) =
        spawn_upstream(StatusCode::BAD_GATEWAY, json!({"detail": "model offline"})).await;
    let proxy = spawn_proxy(&upstream).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/chat", proxy))
        .json(&json!({"query": "anything"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": PROXY_ERROR_MESSAGE}));
}

#[tokio::test]
async fn proxy_maps_unreachable_upstream_to_500() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let proxy = spawn_proxy(&format!("http://127.0.0.1:{}", port)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/chat", proxy))
        .json(&json!({"query": "anything"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], PROXY_ERROR_MESSAGE);
}

#[tokio::test]
async fn proxy_rejects_non_object_body() {
    let (upstream, seen) = spawn_upstream(StatusCode::OK, mentor_reply()).await;
    let proxy = spawn_proxy(&upstream).await;
    let client = reqwest::Client::new();

    for body in [json!(null), json!("Find a mentor"), json!([1, 2])] {
        let resp = client
            .post(format!("{}/api/chat", proxy))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500, "body {}", body);
        let reply: Value = resp.json().await.unwrap();
        assert_eq!(reply, json!({"error": PROXY_ERROR_MESSAGE}));
    }
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn proxy_health() {
    let proxy = spawn_proxy("http://127.0.0.1:9").await;
    let body: Value = reqwest::get(format!("{}/health", proxy))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

// ─── HTTP backend through the proxy ─────────────────────────────────

#[tokio::test]
async fn chat_scenario_through_proxy() {
    let (upstream, _) = spawn_upstream(StatusCode::OK, mentor_reply()).await;
    let proxy = spawn_proxy(&upstream).await;
    let backend = HttpBackend::new(format!("{}/api/chat", proxy), Duration::from_secs(5)).unwrap();
    let dispatcher = QueryDispatcher::new(backend, Surface::Chat);

    let mut conversation = Conversation::new();
    conversation.mount();
    assert!(conversation.send(&dispatcher, "Find a mentor in tech").await);

    let log = conversation.messages();
    assert_eq!(log.len(), 3);
    assert_eq!(log[1].sender, Sender::User);
    assert_eq!(log[2].sender, Sender::Ai);
    match render_message(&log[2]) {
        RenderTree::Records { blocks } => match blocks.as_slice() {
            [RecordBlock::Fields { fields }] => {
                let lines: Vec<String> = fields.iter().map(FieldLine::text).collect();
                assert_eq!(lines, vec!["name: Jane Doe", "focus area: SaaS"]);
            }
            other => panic!("unexpected blocks {:?}", other),
        },
        other => panic!("unexpected tree {:?}", other),
    }
}

#[tokio::test]
async fn failures_become_surface_sentinels() {
    let (upstream, _) = spawn_upstream(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;
    let proxy = spawn_proxy(&upstream).await;
    let endpoint = format!("{}/api/chat", proxy);

    let chat = QueryDispatcher::new(
        HttpBackend::new(endpoint.clone(), Duration::from_secs(5)).unwrap(),
        Surface::Chat,
    );
    let payload = chat.submit("hello").await.unwrap();
    assert_eq!(payload.explanation_text(), Some(CHAT_CONNECTIVITY_MESSAGE));
    assert!(!chat.in_flight());

    let search = QueryDispatcher::new(
        HttpBackend::new(endpoint, Duration::from_secs(5)).unwrap(),
        Surface::Search,
    );
    let payload = search.submit("hello").await.unwrap();
    assert_eq!(payload.error_value(), Some(&json!(SEARCH_FAILURE_MESSAGE)));
}

#[tokio::test]
async fn backend_reports_status_and_message() {
    let (upstream, _) = spawn_upstream(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"message": "warming up"}),
    )
    .await;
    let backend = HttpBackend::new(format!("{}/ask", upstream), Duration::from_secs(5)).unwrap();
    let err = backend
        .ask(&Query::parse("q").unwrap())
        .await
        .unwrap_err();
    match err {
        BackendError::Status { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message.as_deref(), Some("warming up"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn backend_rejects_non_json_body() {
    let app = Router::new().route("/ask", post(|| async { "plain text, not json" }));
    let upstream = spawn(app).await;
    let backend = HttpBackend::new(format!("{}/ask", upstream), Duration::from_secs(5)).unwrap();
    let err = backend
        .ask(&Query::parse("q").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)), "got {:?}", err);
}

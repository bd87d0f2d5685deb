//! Core data types shared by the chat panel and the search overlay.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A trimmed, non-empty query string.
///
/// The only way to obtain a `Query` is [`Query::parse`], so holding one
/// proves the input passed the empty/whitespace check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Trims surrounding whitespace; returns `None` if nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The backend's answer to a query, kept as untyped JSON.
///
/// Structurally the backend sends
/// `{results?: [...], explanation?: string, error?: string, sql?: string}`,
/// but nothing is enforced: the body is passed through exactly as received
/// and interpreted only by [`crate::render::classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponsePayload(Value);

impl ResponsePayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// A locally synthesized `{"explanation": text}` payload.
    pub fn explanation(text: &str) -> Self {
        Self(json!({ "explanation": text }))
    }

    /// A locally synthesized `{"error": text}` payload.
    pub fn error(text: &str) -> Self {
        Self(json!({ "error": text }))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// The `results` field, when it is a JSON array.
    pub fn results(&self) -> Option<&[Value]> {
        self.0.get("results").and_then(Value::as_array).map(Vec::as_slice)
    }

    /// The `explanation` field, when it is a string.
    pub fn explanation_text(&self) -> Option<&str> {
        self.0.get("explanation").and_then(Value::as_str)
    }

    /// The raw `error` field, whatever its type.
    pub fn error_value(&self) -> Option<&Value> {
        self.0.get("error")
    }
}

impl From<Value> for ResponsePayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// One entry of a payload's `results` array, viewed for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRecord<'a> {
    /// An object (or array) record: field name to value, in source order.
    Fields(Vec<(String, &'a Value)>),
    /// A bare scalar standing in for the whole record.
    Scalar(&'a Value),
}

impl<'a> ResultRecord<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => {
                ResultRecord::Fields(map.iter().map(|(k, v)| (k.clone(), v)).collect())
            }
            // Arrays enumerate like objects keyed by position.
            Value::Array(items) => ResultRecord::Fields(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
            ),
            Value::Null => ResultRecord::Fields(Vec::new()),
            other => ResultRecord::Scalar(other),
        }
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// Body of a chat message: plain text or a backend payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Payload(ResponsePayload),
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<ResponsePayload> for MessageContent {
    fn from(payload: ResponsePayload) -> Self {
        MessageContent::Payload(payload)
    }
}

/// A single entry in the chatbot log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub content: MessageContent,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(id: impl Into<String>, content: MessageContent, sender: Sender) -> Self {
        Self {
            id: id.into(),
            content,
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), text.into(), Sender::User)
    }

    pub fn ai(content: MessageContent) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), content, Sender::Ai)
    }
}

/// In-memory state of the hero search overlay that is mirrored to durable
/// storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSession {
    pub query: String,
    pub is_active: bool,
}

impl SearchSession {
    pub fn active(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            is_active: true,
        }
    }

    /// Whether the durable mirror should exist for this state.
    pub fn should_persist(&self) -> bool {
        self.is_active && !self.query.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_trims() {
        let q = Query::parse("  Seed Funding \n").unwrap();
        assert_eq!(q.as_str(), "Seed Funding");
    }

    #[test]
    fn test_query_rejects_blank() {
        assert!(Query::parse("").is_none());
        assert!(Query::parse("   \t\n").is_none());
    }

    #[test]
    fn test_payload_accessors() {
        let p = ResponsePayload::new(json!({
            "results": [{"name": "Jane"}],
            "explanation": "why",
            "sql": "SELECT 1"
        }));
        assert_eq!(p.results().map(<[Value]>::len), Some(1));
        assert_eq!(p.explanation_text(), Some("why"));
        assert!(p.error_value().is_none());
    }

    #[test]
    fn test_results_must_be_array() {
        let p = ResponsePayload::new(json!({ "results": "oops" }));
        assert!(p.results().is_none());
    }

    #[test]
    fn test_record_preserves_field_order() {
        let v: Value =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid_name": 3}"#).unwrap();
        match ResultRecord::from_value(&v) {
            ResultRecord::Fields(fields) => {
                let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(names, vec!["zeta", "alpha", "mid_name"]);
            }
            other => panic!("expected fields, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_record() {
        let v = json!("just text");
        assert_eq!(ResultRecord::from_value(&v), ResultRecord::Scalar(&v));
    }

    #[test]
    fn test_session_persist_rule() {
        assert!(SearchSession::active("x").should_persist());
        assert!(!SearchSession::active("").should_persist());
        assert!(!SearchSession {
            query: "x".into(),
            is_active: false
        }
        .should_persist());
    }
}

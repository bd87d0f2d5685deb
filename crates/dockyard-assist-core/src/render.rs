//! Polymorphic response rendering.
//!
//! A response arrives as loosely-typed JSON. [`classify`] sorts it into a
//! [`PayloadKind`] once, following a fixed decision order, and [`render`]
//! turns that into a [`RenderTree`] the presentation layer can draw.
//!
//! # Decision order
//!
//! First matching branch wins:
//!
//! 1. Plain text (or a top-level JSON string) → [`PayloadKind::PlainText`].
//! 2. Truthy `error` field, search overlay only → [`PayloadKind::Error`].
//! 3. Non-empty `results` array → [`PayloadKind::ResultList`].
//! 4. Fallback. The chat panel shows the `explanation` string if there is
//!    one, otherwise the whole payload as text. The search overlay shows
//!    the fixed "no results" card.
//!
//! Rendering is total: every JSON shape produces a tree.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::dispatch::Surface;
use crate::models::{MessageContent, ResponsePayload, ResultRecord};

/// Shown for any falsy field value.
pub const PLACEHOLDER_VALUE: &str = "N/A";

pub const NO_RESULTS_MESSAGE: &str = "No results found. Please try a different search term.";

pub const CLOSE_LABEL: &str = "Close";

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadKind<'a> {
    PlainText(Cow<'a, str>),
    Error(String),
    ResultList(&'a [Value]),
    Explanation(&'a str),
    /// Search overlay only: nothing to show.
    Empty,
}

/// A drawable response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderTree {
    /// A text block; each entry is one line, separated by explicit breaks.
    Text { lines: Vec<String> },
    /// Blocking error with a control that resets the search.
    ErrorBanner { message: String, close_label: String },
    /// One block per result record, in source order.
    Records { blocks: Vec<RecordBlock> },
    /// Fixed "nothing found" card.
    Placeholder { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordBlock {
    Fields { fields: Vec<FieldLine> },
    Text { lines: Vec<String> },
}

/// One `label: value` row of a record block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldLine {
    pub label: String,
    pub lines: Vec<String>,
}

impl FieldLine {
    /// `label: value`, with line breaks rendered as `\n`.
    pub fn text(&self) -> String {
        format!("{}: {}", self.label, self.lines.join("\n"))
    }
}

/// Sorts message content into exactly one [`PayloadKind`].
pub fn classify(content: &MessageContent, surface: Surface) -> PayloadKind<'_> {
    match content {
        MessageContent::Text(text) => PayloadKind::PlainText(Cow::Borrowed(text)),
        MessageContent::Payload(payload) => classify_payload(payload, surface),
    }
}

/// [`classify`] for a payload received from the backend.
pub fn classify_payload(payload: &ResponsePayload, surface: Surface) -> PayloadKind<'_> {
    let value = payload.value();
    if let Value::String(text) = value {
        return PayloadKind::PlainText(Cow::Borrowed(text));
    }

    if surface == Surface::Search {
        if let Some(err) = payload.error_value().filter(|v| is_truthy(v)) {
            return PayloadKind::Error(coerce_to_string(err));
        }
    }

    if let Some(results) = payload.results().filter(|r| !r.is_empty()) {
        return PayloadKind::ResultList(results);
    }

    match surface {
        Surface::Chat => match payload.explanation_text() {
            Some(text) => PayloadKind::Explanation(text),
            None => PayloadKind::PlainText(Cow::Owned(coerce_to_string(value))),
        },
        Surface::Search => PayloadKind::Empty,
    }
}

/// Renders message content for `surface`. Never panics.
pub fn render(content: &MessageContent, surface: Surface) -> RenderTree {
    from_kind(classify(content, surface))
}

/// [`render`] for a backend payload.
pub fn render_payload(payload: &ResponsePayload, surface: Surface) -> RenderTree {
    from_kind(classify_payload(payload, surface))
}

fn from_kind(kind: PayloadKind<'_>) -> RenderTree {
    match kind {
        PayloadKind::PlainText(text) => RenderTree::Text {
            lines: split_lines(&text),
        },
        PayloadKind::Explanation(text) => RenderTree::Text {
            lines: split_lines(text),
        },
        PayloadKind::Error(message) => RenderTree::ErrorBanner {
            message,
            close_label: CLOSE_LABEL.to_string(),
        },
        PayloadKind::ResultList(records) => RenderTree::Records {
            blocks: records.iter().map(render_record).collect(),
        },
        PayloadKind::Empty => RenderTree::Placeholder {
            message: NO_RESULTS_MESSAGE.to_string(),
        },
    }
}

fn render_record(record: &Value) -> RecordBlock {
    match ResultRecord::from_value(record) {
        ResultRecord::Fields(fields) => RecordBlock::Fields {
            fields: fields
                .into_iter()
                .map(|(name, value)| FieldLine {
                    label: humanize_label(&name),
                    lines: split_lines(&display_value(value)),
                })
                .collect(),
        },
        ResultRecord::Scalar(value) => RecordBlock::Text {
            lines: split_lines(&coerce_to_string(value)),
        },
    }
}

/// Replaces every underscore with a space. No case changes.
pub fn humanize_label(name: &str) -> String {
    name.replace('_', " ")
}

/// Cell text for a field value: its string form, or [`PLACEHOLDER_VALUE`]
/// when the value is falsy.
///
/// Missing and falsy are deliberately conflated, so a numeric `0` shows as
/// `N/A` while the string `"0"` shows as `0`.
pub fn display_value(value: &Value) -> String {
    if is_truthy(value) {
        coerce_to_string(value)
    } else {
        PLACEHOLDER_VALUE.to_string()
    }
}

/// `null`, `false`, numeric zero, `""` and `[]` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Converts any JSON value to display text.
///
/// Strings are taken verbatim, numbers drop a redundant `.0`, arrays join
/// their elements with commas, objects print as compact JSON.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64 Display omits the trailing ".0" that serde_json would print.
        n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
    }
}

/// Splits on `\n` only; all other whitespace is kept as-is.
fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

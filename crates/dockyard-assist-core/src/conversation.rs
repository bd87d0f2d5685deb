//! Chatbot conversation log.
//!
//! The log is append-only: messages are never edited or removed. It moves
//! through three states:
//!
//! ```text
//! Empty ──mount()──▶ Greeted ──send()──▶ Conversing ──send()──▶ ...
//! ```
//!
//! A user message is appended as soon as a query is accepted, before the
//! backend answers; the AI reply is appended when the request settles.
//! Every append is reported to the follow hook so a view can keep the
//! newest message in sight.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error};

use crate::dispatch::{QueryBackend, QueryDispatcher, Surface};
use crate::models::{Message, MessageContent, Query, ResponsePayload, Sender};
use crate::render::{render, RenderTree};

pub const WELCOME_ID: &str = "welcome-message";

pub const WELCOME_MESSAGE: &str = "Hi! I'm your StartupTN AI assistant. I can help you find funding opportunities, connect with mentors, and guide you through your startup journey. What can I help you with today?";

/// Reply appended when producing an answer fails outright.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again.";

/// Produces the AI reply for an accepted query.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, query: &Query) -> Result<ResponsePayload>;
}

#[async_trait]
impl<B: QueryBackend> Responder for QueryDispatcher<B> {
    async fn respond(&self, query: &Query) -> Result<ResponsePayload> {
        Ok(self.dispatch(query).await)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Empty,
    Greeted,
    Conversing,
}

/// A user message that is waiting for its reply.
#[derive(Debug)]
#[must_use = "settle the pending reply or the typing indicator stays on"]
pub struct PendingReply {
    query: Query,
}

impl PendingReply {
    pub fn query(&self) -> &Query {
        &self.query
    }
}

type FollowHook = Box<dyn FnMut(&Message) + Send>;

/// The chatbot panel: message log, typing indicator and open flag.
pub struct Conversation {
    messages: Vec<Message>,
    typing: bool,
    open: bool,
    follow: Option<FollowHook>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            typing: false,
            open: false,
            follow: None,
        }
    }

    /// Registers a callback invoked with each newly appended message.
    pub fn with_follow(mut self, hook: impl FnMut(&Message) + Send + 'static) -> Self {
        self.follow = Some(Box::new(hook));
        self
    }

    /// Greets once. Has no effect if the log already has messages.
    pub fn mount(&mut self) {
        if !self.messages.is_empty() {
            return;
        }
        self.push(Message::new(
            WELCOME_ID,
            MessageContent::from(WELCOME_MESSAGE),
            Sender::Ai,
        ));
    }

    pub fn state(&self) -> ConversationState {
        match self.messages.len() {
            0 => ConversationState::Empty,
            1 => ConversationState::Greeted,
            _ => ConversationState::Conversing,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Hides the panel. The log is kept.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Accepts `raw` as a user message and turns the typing indicator on.
    ///
    /// Returns `None` (and changes nothing) for blank input.
    pub fn begin(&mut self, raw: &str) -> Option<PendingReply> {
        let query = Query::parse(raw)?;
        self.push(Message::user(query.as_str()));
        self.typing = true;
        Some(PendingReply { query })
    }

    /// Appends the reply for `pending` and turns the typing indicator off.
    ///
    /// An `Err` outcome appends [`FALLBACK_REPLY`] instead.
    pub fn settle(&mut self, pending: PendingReply, outcome: Result<ResponsePayload>) {
        let content = match outcome {
            Ok(payload) => MessageContent::Payload(payload),
            Err(err) => {
                error!(query = %pending.query, error = %err, "failed to produce reply");
                MessageContent::from(FALLBACK_REPLY)
            }
        };
        self.push(Message::ai(content));
        self.typing = false;
    }

    /// Submits `raw` and waits for the reply. Returns false for blank input.
    pub async fn send<R: Responder + ?Sized>(&mut self, responder: &R, raw: &str) -> bool {
        let Some(pending) = self.begin(raw) else {
            return false;
        };
        let outcome = responder.respond(pending.query()).await;
        self.settle(pending, outcome);
        true
    }

    fn push(&mut self, message: Message) {
        debug!(id = %message.id, sender = ?message.sender, "appending message");
        self.messages.push(message);
        if let (Some(hook), Some(latest)) = (self.follow.as_mut(), self.messages.last()) {
            hook(latest);
        }
    }
}

/// Renders one message as the chat panel shows it.
pub fn render_message(message: &Message) -> RenderTree {
    render(&message.content, Surface::Chat)
}

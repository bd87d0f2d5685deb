//! # Dockyard Assist Core
//!
//! Runtime-agnostic logic for the Dockyard Assist widgets: the response
//! payload model, the polymorphic response renderer, the chatbot
//! conversation log, and the hero search overlay with its durable session
//! mirror.
//!
//! This crate contains no tokio, HTTP client, or filesystem I/O. Network
//! access enters through the [`dispatch::QueryBackend`] trait and durable
//! storage through [`session::KeyValueStorage`], so every state machine here
//! can be driven by in-memory fakes.

pub mod conversation;
pub mod dispatch;
pub mod models;
pub mod render;
pub mod search;
pub mod session;

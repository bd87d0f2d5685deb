//! # Dockyard Assist
//!
//! Search and chat widgets for a natural-language startup knowledge base.
//!
//! A visitor's question travels from one of two widgets, through a small
//! proxy, to the question-answering backend. The answer comes back as
//! loosely-typed JSON (`results`, `explanation`, `error`, `sql`) and is
//! rendered according to the widget that asked.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Chat panel   │──▶│    Proxy     │──▶│  QA backend  │
//! │ Hero search  │   │  /api/chat   │   │     /ask     │
//! └──────┬───────┘   └──────────────┘   └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │ Session file │  (hero search only)
//! └──────────────┘
//! ```
//!
//! The widget state machines, rendering and session logic live in
//! `dockyard-assist-core`; this crate supplies the HTTP transport, durable
//! storage, the proxy server and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! dockyard serve proxy                 # forward /api/chat to the backend
//! dockyard chat                        # interactive chatbot
//! dockyard search "Seed Funding"       # hero search
//! dockyard search                      # show the restored search
//! dockyard search --close              # close it
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`client`] | HTTP query backend |
//! | [`storage`] | File-backed key-value storage |
//! | [`proxy`] | Chat proxy HTTP server |
//! | [`output`] | Terminal formatting |
//! | [`chat`] | Chatbot commands |
//! | [`search`] | Hero search commands |

pub mod chat;
pub mod client;
pub mod config;
pub mod output;
pub mod proxy;
pub mod search;
pub mod storage;

pub use dockyard_assist_core::{conversation, dispatch, models, render, session};

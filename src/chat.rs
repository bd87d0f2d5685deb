//! Chatbot commands.
//!
//! Wires a [`Conversation`] to the HTTP backend. The interactive session
//! prints each message as it is appended, so the terminal always follows
//! the newest one.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use dockyard_assist_core::conversation::{render_message, Conversation, Responder};
use dockyard_assist_core::dispatch::{QueryDispatcher, Surface};
use dockyard_assist_core::models::Sender;

use crate::client::HttpBackend;
use crate::config::Config;
use crate::output::{format_message, format_tree, TYPING_INDICATOR};

/// Typed at the prompt to leave the chat.
pub const QUIT_COMMAND: &str = "/quit";

fn chat_dispatcher(config: &Config) -> Result<QueryDispatcher<HttpBackend>> {
    Ok(QueryDispatcher::new(
        HttpBackend::from_config(config)?,
        Surface::Chat,
    ))
}

/// Interactive chat over stdin/stdout until EOF or `/quit`.
pub async fn run_chat(config: &Config) -> Result<()> {
    let dispatcher = chat_dispatcher(config)?;
    let interactive = atty::is(atty::Stream::Stdin);

    let mut conversation = Conversation::new().with_follow(move |message| {
        // A terminal user already sees what they typed.
        if interactive && message.sender == Sender::User {
            return;
        }
        println!("{}\n", format_message(message));
    });
    conversation.open();
    conversation.mount();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == QUIT_COMMAND {
            break;
        }
        let Some(pending) = conversation.begin(&line) else {
            continue;
        };
        if interactive && conversation.is_typing() {
            eprintln!("{}", TYPING_INDICATOR);
        }
        let outcome = dispatcher.respond(pending.query()).await;
        conversation.settle(pending, outcome);
    }

    conversation.close();
    Ok(())
}

/// One question, one printed answer. Blank input prints nothing.
pub async fn run_ask(config: &Config, query: &str) -> Result<()> {
    let dispatcher = chat_dispatcher(config)?;
    let mut conversation = Conversation::new();
    if !conversation.send(&dispatcher, query).await {
        return Ok(());
    }
    if let Some(reply) = conversation.latest() {
        println!("{}", format_tree(&render_message(reply), ""));
    }
    Ok(())
}

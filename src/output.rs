//! Plain-text presentation of render trees for the terminal.
//!
//! Line breaks inside a value are kept and continuation lines are indented
//! under their label, so multi-line fields stay readable.

use dockyard_assist_core::conversation::render_message;
use dockyard_assist_core::models::{Message, Sender};
use dockyard_assist_core::render::{RecordBlock, RenderTree};
use dockyard_assist_core::search::OverlayView;

pub const TYPING_INDICATOR: &str = "Assistant is typing...";

/// Formats a render tree, prefixing every line with `indent`.
pub fn format_tree(tree: &RenderTree, indent: &str) -> String {
    let mut out = Vec::new();
    match tree {
        RenderTree::Text { lines } => {
            out.extend(lines.iter().map(|l| format!("{}{}", indent, l)));
        }
        RenderTree::ErrorBanner {
            message,
            close_label,
        } => {
            out.push(format!("{}Error: {}", indent, message));
            out.push(format!("{}[{}]", indent, close_label));
        }
        RenderTree::Records { blocks } => {
            for (i, block) in blocks.iter().enumerate() {
                if i > 0 {
                    out.push(String::new());
                }
                out.push(format!("{}{}.", indent, i + 1));
                push_block(&mut out, block, &format!("{}    ", indent));
            }
        }
        RenderTree::Placeholder { message } => {
            out.push(format!("{}{}", indent, message));
        }
    }
    out.join("\n")
}

fn push_block(out: &mut Vec<String>, block: &RecordBlock, indent: &str) {
    match block {
        RecordBlock::Fields { fields } => {
            for field in fields {
                let head = format!("{}: ", field.label);
                let pad = " ".repeat(head.chars().count());
                for (i, line) in field.lines.iter().enumerate() {
                    if i == 0 {
                        out.push(format!("{}{}{}", indent, head, line));
                    } else {
                        out.push(format!("{}{}{}", indent, pad, line));
                    }
                }
            }
        }
        RecordBlock::Text { lines } => {
            out.extend(lines.iter().map(|l| format!("{}{}", indent, l)));
        }
    }
}

/// One chat message with its sender and local time.
pub fn format_message(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Ai => "Assistant",
    };
    let time = message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M");
    format!(
        "[{}] {}:\n{}",
        time,
        who,
        format_tree(&render_message(message), "  ")
    )
}

/// The search overlay area. Hidden overlays format as an empty string.
pub fn format_overlay(view: &OverlayView) -> String {
    match view {
        OverlayView::Hidden => String::new(),
        OverlayView::Loading { message } => message.clone(),
        OverlayView::Error(tree) => format_tree(tree, ""),
        OverlayView::Results { body, close_label } => {
            format!("{}\n\n[{}]", format_tree(body, ""), close_label)
        }
    }
}

//! Event handler system.
//!
//! Add new event handlers by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_event;` below
//! 3. Adding the handler to one of the builders below

pub mod membership;
pub mod moderation;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{debug, error};

use crate::bot::dispatcher::AppState;

/// Build the combined handler for the bot's own membership changes.
pub fn membership_handler() -> UpdateHandler<anyhow::Error> {
    membership::handler()
}

/// Build the group moderation handler. Runs ahead of command dispatch.
pub fn moderation_handler() -> UpdateHandler<anyhow::Error> {
    moderation::handler()
}

/// Build the message event handler.
///
/// Violating group messages were claimed by [`moderation_handler`];
/// this only consumes pending settings input.
pub fn message_event_handler() -> UpdateHandler<anyhow::Error> {
    dptree::endpoint(unified_message_handler)
}

/// Unified message handler that runs all sub-handlers.
async fn unified_message_handler(msg: Message, state: AppState) -> anyhow::Result<()> {
    let text = msg.text().unwrap_or("");
    let is_command = text.starts_with('/');

    debug!(
        "unified_message_handler: chat={}, text='{}', is_command={}",
        msg.chat.id,
        text.chars().take(30).collect::<String>(),
        is_command
    );

    // Keyword entry after "Add keywords"
    if let (Some(user), false) = (msg.from.as_ref(), is_command || text.is_empty()) {
        match state
            .moderator
            .on_text_input(user.id, text, &state.responder(msg.chat.id))
            .await
        {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => error!("Settings input error: {}", e),
        }
    }

    Ok(())
}

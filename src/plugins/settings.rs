//! Settings plugin.
//!
//! /settings opens the per-chat menu; button presses come back as callback
//! queries. Also /keywords, /allowlink and /blocklink.

use teloxide::prelude::*;
use tracing::warn;

use crate::bot::adapter::CallbackResponder;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use aegis::moderation::Responder;
use aegis::policy::ChatKind;

const GROUP_ONLY: &str = "Use this command inside the group you want to configure.";

fn chat_kind(msg: &Message) -> ChatKind {
    if msg.chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Group
    }
}

fn is_group(msg: &Message) -> bool {
    msg.chat.is_group() || msg.chat.is_supergroup()
}

/// First argument after the command, if any.
fn first_arg(msg: &Message) -> Option<&str> {
    msg.text()
        .and_then(|t| t.split_whitespace().nth(1))
}

pub async fn settings_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);
    if !is_group(&msg) {
        responder.reply(GROUP_ONLY).await?;
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    // Remember the chat for this user's "My Groups" list.
    let title = msg.chat.title().unwrap_or("Group");
    state
        .moderator
        .register_chat(msg.chat.id, chat_kind(&msg), Some((user.id, title)));

    state
        .moderator
        .open_settings(msg.chat.id, user.id, &responder)
        .await?;
    Ok(())
}

pub async fn keywords_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);
    if !is_group(&msg) {
        responder.reply(GROUP_ONLY).await?;
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    state
        .moderator
        .list_keywords(msg.chat.id, user.id, &responder)
        .await?;
    Ok(())
}

pub async fn allowlink_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);
    if !is_group(&msg) {
        responder.reply(GROUP_ONLY).await?;
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    state
        .moderator
        .allow_link(msg.chat.id, user.id, first_arg(&msg), &responder)
        .await?;
    Ok(())
}

pub async fn blocklink_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);
    if !is_group(&msg) {
        responder.reply(GROUP_ONLY).await?;
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    state
        .moderator
        .block_link(msg.chat.id, user.id, first_arg(&msg), &responder)
        .await?;
    Ok(())
}

/// Handle settings callback queries (cfg:*).
pub async fn settings_callback_handler(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
) -> anyhow::Result<()> {
    let data = q.data.clone().unwrap_or_default();
    let responder = CallbackResponder::new(bot, &q);

    let result = state
        .moderator
        .on_admin_action(q.from.id, &data, &responder)
        .await;
    if let Err(e) = &result {
        warn!("Settings callback from {} failed: {}", q.from.id, e);
    }

    responder.finish().await?;
    result.map_err(Into::into)
}

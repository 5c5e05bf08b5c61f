//! Manual moderation commands.
//!
//! /warn, /warns, /rmwarn, /resetwarn, /ban, /mute, /unban, /unmute.
//! The target is the replied-to user or a numeric user id argument.

use teloxide::prelude::*;
use teloxide::types::UserId;

use crate::bot::dispatcher::AppState;
use aegis::moderation::Responder;
use aegis::moderator::{Punishment, Target};
use aegis::utils::display_name;

const GROUP_ONLY: &str = "This command only works in groups.";
const NEED_TARGET: &str = "Reply to a user or give their numeric id.";

/// Split command arguments into an optional user id and the rest.
///
/// With a reply the whole argument string is the rest; otherwise the first
/// argument must be a user id.
fn split_args(text: &str, has_reply: bool) -> (Option<u64>, Option<String>) {
    let mut args = text.split_whitespace().skip(1);
    let id = if has_reply {
        None
    } else {
        match args.next().map(str::parse::<u64>) {
            Some(Ok(id)) => Some(id),
            _ => return (None, None),
        }
    };

    let rest: Vec<&str> = args.collect();
    let rest = (!rest.is_empty()).then(|| rest.join(" "));
    (id, rest)
}

/// Resolve the command target and remaining arguments.
fn resolve_target(msg: &Message) -> Option<(Target, Option<String>)> {
    let text = msg.text().unwrap_or("");
    let replied = msg.reply_to_message().and_then(|r| r.from.as_ref());

    let (id, rest) = split_args(text, replied.is_some());
    let target = match (replied, id) {
        (Some(user), _) => Target {
            user_id: user.id,
            name: display_name(Some(&user.first_name), user.id.0),
        },
        (None, Some(id)) => Target {
            user_id: UserId(id),
            name: display_name(None, id),
        },
        (None, None) => return None,
    };
    Some((target, rest))
}

/// Common preamble: group chat, known sender, resolvable target.
async fn command_context(
    msg: &Message,
    responder: &dyn Responder,
) -> anyhow::Result<Option<(UserId, Target, Option<String>)>> {
    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        responder.reply(GROUP_ONLY).await?;
        return Ok(None);
    }
    let Some(admin) = msg.from.as_ref().map(|u| u.id) else {
        return Ok(None);
    };
    let Some((target, rest)) = resolve_target(msg) else {
        responder.reply(NEED_TARGET).await?;
        return Ok(None);
    };
    Ok(Some((admin, target, rest)))
}

pub async fn warn_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);
    let Some((admin, target, reason)) = command_context(&msg, &responder).await? else {
        return Ok(());
    };
    state
        .moderator
        .warn(msg.chat.id, admin, &target, reason.as_deref(), &responder)
        .await?;
    Ok(())
}

pub async fn warns_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);

    // Without a target, show the sender's own count.
    let target = match resolve_target(&msg) {
        Some((target, _)) => target,
        None => match msg.from.as_ref() {
            Some(user) => Target {
                user_id: user.id,
                name: display_name(Some(&user.first_name), user.id.0),
            },
            None => return Ok(()),
        },
    };
    state
        .moderator
        .show_warnings(msg.chat.id, &target, &responder)
        .await?;
    Ok(())
}

pub async fn rmwarn_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);
    let Some((admin, target, _)) = command_context(&msg, &responder).await? else {
        return Ok(());
    };
    state
        .moderator
        .remove_warning(msg.chat.id, admin, &target, &responder)
        .await?;
    Ok(())
}

pub async fn resetwarn_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);
    let Some((admin, target, _)) = command_context(&msg, &responder).await? else {
        return Ok(());
    };
    state
        .moderator
        .reset_warnings(msg.chat.id, admin, &target, &responder)
        .await?;
    Ok(())
}

pub async fn ban_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    punish(msg, state, Punishment::Ban).await
}

pub async fn mute_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    punish(msg, state, Punishment::Mute).await
}

pub async fn unban_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    pardon(msg, state, Punishment::Ban).await
}

pub async fn unmute_command(msg: Message, state: AppState) -> anyhow::Result<()> {
    pardon(msg, state, Punishment::Mute).await
}

/// /ban and /mute: `[duration]` may follow the target.
async fn punish(msg: Message, state: AppState, kind: Punishment) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);
    let Some((admin, target, rest)) = command_context(&msg, &responder).await? else {
        return Ok(());
    };
    let duration = rest.as_deref().and_then(|r| r.split_whitespace().next());
    state
        .moderator
        .punish(msg.chat.id, admin, &target, kind, duration, &responder)
        .await?;
    Ok(())
}

async fn pardon(msg: Message, state: AppState, kind: Punishment) -> anyhow::Result<()> {
    let responder = state.responder(msg.chat.id);
    let Some((admin, target, _)) = command_context(&msg, &responder).await? else {
        return Ok(());
    };
    state
        .moderator
        .pardon(msg.chat.id, admin, &target, kind, &responder)
        .await?;
    Ok(())
}

//! /start, /help and /channels.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use aegis::moderation::Responder;
use aegis::policy::ChatKind;

const HELP_TEXT: &str = "<b>Aegis</b> keeps your group clean.\n\n\
<b>Settings</b>\n\
/settings - configure link, forward, mention and keyword rules\n\
/keywords - list blocked keywords\n\
/allowlink [domain] - allow a domain, or list allowed ones\n\
/blocklink &lt;domain&gt; - remove an allowed domain\n\
/channels - in private, list channels you added me to\n\n\
<b>Moderation</b> (reply to a user or give their id)\n\
/warn [reason] - warn; 3 warnings mean a 1 hour ban\n\
/warns - show warnings\n\
/rmwarn - remove one warning\n\
/resetwarn - clear warnings\n\
/ban [duration] - ban, e.g. 30m, 6h, 7d\n\
/mute [duration] - mute\n\
/unban, /unmute - lift a restriction";

/// Handle the /start command.
///
/// In a group this registers the chat for the sender; in private it shows
/// the groups the sender has registered.
pub async fn start_handler(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    if msg.chat.is_private() {
        return state
            .moderator
            .show_groups(user.id, &state.responder(chat_id))
            .await
            .map_err(Into::into);
    }

    let title = msg.chat.title().unwrap_or("Group");
    state
        .moderator
        .register_chat(chat_id, ChatKind::Group, Some((user.id, title)));

    let pm_url = format!("https://t.me/{}?start=groups", state.bot_username);
    let mut request = bot.send_message(
        chat_id,
        "👋 I'm watching this group now. Admins can use /settings to pick the rules.",
    );
    if let Ok(url) = pm_url.parse() {
        request = request.reply_markup(InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::url("👥 My Groups", url),
        ]]));
    }
    request.await?;
    Ok(())
}

/// Handle /help command.
pub async fn help_handler(bot: ThrottledBot, msg: Message) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, HELP_TEXT)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle the /channels command. Private chats only.
pub async fn channels_handler(msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let responder = state.responder(msg.chat.id);

    if !msg.chat.is_private() {
        responder
            .reply("📢 Open a private chat with me and send /channels there.")
            .await?;
        return Ok(());
    }
    state.moderator.show_channels(user.id, &responder).await?;
    Ok(())
}

//! The bot's own membership in chats.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ChatMemberUpdated;
use tracing::info;

use crate::bot::dispatcher::AppState;
use aegis::policy::ChatKind;

/// Returns the handler for `my_chat_member` updates.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    dptree::endpoint(membership_handler)
}

async fn membership_handler(update: ChatMemberUpdated, state: AppState) -> anyhow::Result<()> {
    let chat = &update.chat;
    let was_present = update.old_chat_member.is_present();
    let is_present = update.new_chat_member.is_present();

    if !is_present {
        info!("Removed from chat {}, dropping its state", chat.id);
        state.moderator.forget_chat(chat.id);
        return Ok(());
    }

    // Our own rights may have changed; reload admins now so the first
    // message from an admin finds them cached.
    state.moderator.admins().invalidate(chat.id);
    state.moderator.warm_admins(chat.id).await;

    if !was_present {
        info!("Added to chat {} by {}", chat.id, update.from.id);
        let kind = if chat.is_channel() {
            ChatKind::Channel
        } else {
            ChatKind::Group
        };
        let title = chat.title().unwrap_or("Group");
        state
            .moderator
            .register_chat(chat.id, kind, Some((update.from.id, title)));
    }
    Ok(())
}

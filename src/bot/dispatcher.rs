//! Update dispatcher setup.
//!
//! Builds the dispatcher with command, message, membership and callback
//! handlers sharing one [`AppState`].

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use super::adapter::TelegramAdapter;
use crate::events;
use crate::plugins;
use aegis::cache::CacheRegistry;
use aegis::moderation::{ChatAdapter, ChatResponder, SystemClock};
use aegis::moderator::{Moderator, ModeratorConfig};

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The moderation core.
    pub moderator: Moderator,

    /// Outbound calls into Telegram, shared with the core.
    pub adapter: Arc<dyn ChatAdapter>,

    /// Bot username (without @) for deep links.
    pub bot_username: String,
}

impl AppState {
    pub fn new(
        bot: ThrottledBot,
        cache: &CacheRegistry,
        config: &ModeratorConfig,
        bot_username: String,
    ) -> Self {
        let adapter: Arc<dyn ChatAdapter> = Arc::new(TelegramAdapter::new(bot));
        let moderator = Moderator::new(
            Arc::clone(&adapter),
            Arc::new(SystemClock),
            cache,
            config,
        );

        Self {
            moderator,
            adapter,
            bot_username,
        }
    }

    /// Responder that answers with new messages in `chat_id`.
    pub fn responder(&self, chat_id: ChatId) -> ChatResponder {
        ChatResponder::new(Arc::clone(&self.adapter), chat_id)
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    cache: &CacheRegistry,
    config: &ModeratorConfig,
    bot_username: String,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    let state = AppState::new(bot.clone(), cache, config, bot_username);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Moderation first so commands can't carry violations past it,
    // then commands, then settings input
    let message_handler = Update::filter_message()
        .branch(events::moderation_handler())
        .branch(plugins::command_handler())
        .branch(events::message_event_handler());

    // The bot's own membership changes
    let membership_handler = Update::filter_my_chat_member().branch(events::membership_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(membership_handler)
        .branch(plugins::callback_handler())
}

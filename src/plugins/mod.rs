//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()`

pub mod moderation;
pub mod settings;
pub mod start;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use aegis::settings::MenuAction;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start(String),

    #[command(description = "Show help")]
    Help,

    // Settings
    #[command(description = "Open moderation settings")]
    Settings,

    #[command(description = "List blocked keywords")]
    Keywords,

    #[command(description = "Allow a link domain")]
    Allowlink,

    #[command(description = "Remove an allowed link domain")]
    Blocklink,

    #[command(description = "List your channels")]
    Channels,

    // Warnings
    #[command(description = "Warn a user")]
    Warn,

    #[command(description = "Show a user's warnings")]
    Warns,

    #[command(description = "Remove one warning")]
    Rmwarn,

    #[command(description = "Reset a user's warnings")]
    Resetwarn,

    // Restrictions
    #[command(description = "Ban a user")]
    Ban,

    #[command(description = "Unban a user")]
    Unban,

    #[command(description = "Mute a user")]
    Mute,

    #[command(description = "Unmute a user")]
    Unmute,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start(args)].endpoint(handle_start))
        .branch(case![Command::Help].endpoint(start::help_handler))
        // Settings
        .branch(case![Command::Settings].endpoint(settings::settings_command))
        .branch(case![Command::Keywords].endpoint(settings::keywords_command))
        .branch(case![Command::Allowlink].endpoint(settings::allowlink_command))
        .branch(case![Command::Blocklink].endpoint(settings::blocklink_command))
        .branch(case![Command::Channels].endpoint(start::channels_handler))
        // Warning
        .branch(case![Command::Warn].endpoint(moderation::warn_command))
        .branch(case![Command::Warns].endpoint(moderation::warns_command))
        .branch(case![Command::Rmwarn].endpoint(moderation::rmwarn_command))
        .branch(case![Command::Resetwarn].endpoint(moderation::resetwarn_command))
        // Ban / Mute
        .branch(case![Command::Ban].endpoint(moderation::ban_command))
        .branch(case![Command::Unban].endpoint(moderation::unban_command))
        .branch(case![Command::Mute].endpoint(moderation::mute_command))
        .branch(case![Command::Unmute].endpoint(moderation::unmute_command))
}

/// Handle /start; the deep-link payload is not needed.
async fn handle_start(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    _args: String,
) -> anyhow::Result<()> {
    start::start_handler(bot, msg, state).await
}

/// Build the callback query handler.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query().branch(
        dptree::filter(|q: CallbackQuery| {
            q.data
                .as_deref()
                .map(MenuAction::is_settings_data)
                .unwrap_or(false)
        })
        .endpoint(settings::settings_callback_handler),
    )
}

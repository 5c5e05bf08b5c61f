//! Aegis - per-chat moderation bot for Telegram groups.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `bot` - Telegram adapter, dispatcher and runners (with Throttle for API rate limiting)
//! - `plugins` - Command and settings callback handlers
//! - `events` - Message and membership handlers
//!
//! Everything that decides *what* to do lives in the `aegis` library crate.

mod bot;
mod config;
mod events;
mod plugins;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use aegis::cache::CacheRegistry;
use config::Config;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aegis=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Aegis bot...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    // Shared by the admin cache and settings sessions
    let cache = CacheRegistry::new();

    // Throttle respects Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    let bot_username = me.username().to_string();
    info!("Bot username: @{}", bot_username);

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let dispatcher =
        bot::build_dispatcher(bot.clone(), &cache, &config.moderator(), bot_username);

    bot::run(&config, bot, dispatcher).await
}

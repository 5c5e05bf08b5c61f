//! Per-chat moderation policy engine.
//!
//! The library holds every decision the bot makes; the binary only turns
//! Telegram updates into calls on [`moderator::Moderator`] and implements
//! [`moderation::ChatAdapter`] on top of the Bot API.
//!
//! - `policy` - per-chat rules, keywords, allowed domains and warning counters
//! - `moderation` - violation detection and enforcement
//! - `settings` - the inline settings menu protocol
//! - `permissions` - cached admin lookups
//! - `cache` - named Moka caches
//! - `utils` - duration codec and text helpers

pub mod cache;
pub mod directory;
pub mod error;
pub mod moderation;
pub mod moderator;
pub mod permissions;
pub mod policy;
pub mod settings;
pub mod utils;

#[cfg(test)]
mod testing;

//! Configuration module for Aegis bot.
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::warn;

use aegis::moderator::ModeratorConfig;

/// Bot running mode
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Owner user IDs (comma-separated).
    /// These users count as admins in every chat.
    pub owner_ids: Vec<u64>,

    // Moderation
    pub admin_cache_ttl: Duration,
    pub session_idle: Duration,
    pub short_link_domains: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let bot_token = env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?;

        let bot_mode = match env::var("BOT_MODE")
            .unwrap_or_else(|_| "polling".to_string())
            .to_lowercase()
            .as_str()
        {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = env::var("WEBHOOK_URL").ok().filter(|s| !s.trim().is_empty());

        // Validate webhook URL is set if mode is webhook
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            bail!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        Ok(Self {
            bot_token,
            bot_mode,
            webhook_url,
            webhook_port: parse_or("WEBHOOK_PORT", 8443),
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            owner_ids: parse_list(&env::var("OWNER_IDS").unwrap_or_default())
                .iter()
                .filter_map(|s| s.parse::<u64>().ok())
                .collect(),
            admin_cache_ttl: Duration::from_secs(parse_or("ADMIN_CACHE_TTL_SECS", 300)),
            session_idle: Duration::from_secs(parse_or("SESSION_IDLE_SECS", 600)),
            short_link_domains: parse_list(&env::var("SHORT_LINK_DOMAINS").unwrap_or_default()),
        })
    }

    /// Settings for the moderation core.
    pub fn moderator(&self) -> ModeratorConfig {
        ModeratorConfig {
            owner_ids: self.owner_ids.clone(),
            admin_cache_ttl: self.admin_cache_ttl,
            session_idle: self.session_idle,
            short_link_domains: self.short_link_domains.clone(),
        }
    }
}

/// Read a number, falling back to `default` when unset or invalid.
fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_value<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }
    }
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

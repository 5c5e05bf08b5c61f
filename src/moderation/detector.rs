//! Violation detection.
//!
//! Pure functions over a policy snapshot and a normalized inbound message.

use std::collections::BTreeSet;

use teloxide::types::{ChatId, MessageId, UserId};

use crate::policy::{ChatPolicy, RuleCategory, normalize_domain};

/// Link-shortener and invite hosts treated as links even without a scheme.
pub const DEFAULT_SHORT_LINK_DOMAINS: &[&str] = &[
    "t.me/",
    "telegram.me/",
    "bit.ly/",
    "tinyurl.com/",
    "goo.gl/",
    "t.co/",
    "ow.ly/",
    "is.gd/",
    "cutt.ly/",
    "rb.gy/",
];

/// Message entity the detector cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// `@username`
    Mention,
    /// Mention of a user without a username.
    TextMention,
    /// Bare URL recognised by the platform, with its text.
    Url(String),
    /// Hyperlinked text, with its target.
    TextLink(String),
}

/// Platform-neutral view of a chat message.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub sender_name: String,
    /// Message text, or the media caption.
    pub text: String,
    pub is_forwarded: bool,
    pub entities: Vec<EntityKind>,
    /// Sender is already known to be an admin (anonymous admin, channel post).
    pub is_admin_hint: bool,
}

impl InboundMessage {
    pub fn has_mention(&self) -> bool {
        self.entities
            .iter()
            .any(|e| matches!(e, EntityKind::Mention | EntityKind::TextMention))
    }
}

/// Finds links in message text.
#[derive(Debug, Clone)]
pub struct LinkMatcher {
    short_link_domains: Vec<String>,
}

impl Default for LinkMatcher {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl LinkMatcher {
    /// Matcher using the built-in shorteners plus `extra` hosts.
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut short_link_domains: Vec<String> = DEFAULT_SHORT_LINK_DOMAINS
            .iter()
            .map(|d| d.to_string())
            .collect();

        for domain in extra {
            let domain = normalize_domain(domain.as_ref());
            if domain.is_empty() {
                continue;
            }
            let fragment = format!("{domain}/");
            if !short_link_domains.contains(&fragment) {
                short_link_domains.push(fragment);
            }
        }

        Self { short_link_domains }
    }

    /// Whether a single whitespace-separated token looks like a link.
    pub fn is_link_token(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        lower.contains("http://")
            || lower.contains("https://")
            || lower.contains("www.")
            || self
                .short_link_domains
                .iter()
                .any(|d| lower.contains(d.as_str()))
    }

    /// Link candidates from text tokens and URL entities.
    pub fn links<'a>(&self, msg: &'a InboundMessage) -> Vec<&'a str> {
        let mut links: Vec<&str> = msg
            .text
            .split_whitespace()
            .filter(|token| self.is_link_token(token))
            .collect();

        for entity in &msg.entities {
            if let EntityKind::Url(url) | EntityKind::TextLink(url) = entity {
                links.push(url.as_str());
            }
        }
        links
    }

    /// True if the message carries at least one link outside `allowed`.
    pub fn has_blocked_link(&self, msg: &InboundMessage, allowed: &BTreeSet<String>) -> bool {
        self.links(msg)
            .into_iter()
            .any(|link| !is_allowed(link, allowed))
    }
}

/// A link is allowed when its host is an allowed domain or a subdomain of one.
fn is_allowed(link: &str, allowed: &BTreeSet<String>) -> bool {
    if allowed.is_empty() {
        return false;
    }

    let lower = link.to_lowercase();
    // Drop anything glued in front of the scheme, e.g. "(https://...".
    let start = lower.find("http").unwrap_or(0);
    let trimmed = lower[start..].trim_matches(|c: char| !c.is_alphanumeric() && c != '/');
    let host = normalize_domain(trimmed);
    let host = host.split(':').next().unwrap_or_default();

    allowed
        .iter()
        .any(|domain| host == domain || host.ends_with(&format!(".{domain}")))
}

/// Applies a chat's rules to inbound messages.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    links: LinkMatcher,
}

impl Detector {
    pub fn new(links: LinkMatcher) -> Self {
        Self { links }
    }

    /// First violated category in priority order, if any.
    ///
    /// Only rules that are enabled with a real action are evaluated.
    pub fn detect(&self, policy: &ChatPolicy, msg: &InboundMessage) -> Option<RuleCategory> {
        policy
            .rules()
            .filter(|(_, rule)| rule.is_active())
            .map(|(category, _)| category)
            .find(|category| self.matches(*category, policy, msg))
    }

    fn matches(&self, category: RuleCategory, policy: &ChatPolicy, msg: &InboundMessage) -> bool {
        match category {
            RuleCategory::Link => self.links.has_blocked_link(msg, &policy.allowed_domains),
            RuleCategory::Forward => msg.is_forwarded,
            RuleCategory::Mention => msg.has_mention(),
            RuleCategory::Custom => policy.matching_keyword(&msg.text).is_some(),
        }
    }
}

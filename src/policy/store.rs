//! In-memory policy store with per-chat locking.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use teloxide::types::{ChatId, UserId};
use tracing::{debug, info};

use super::model::{CategoryRule, ChatKind, ChatPolicy, RuleCategory};
use crate::error::{ModerationError, ModerationResult};

/// Store for every managed chat's rules, keywords and warnings.
///
/// Each chat sits behind its own mutex, so different chats never contend
/// while operations on one chat are serialized. Guards are never held
/// across an await point.
#[derive(Clone, Default)]
pub struct PolicyStore {
    chats: Arc<DashMap<ChatId, Arc<Mutex<ChatPolicy>>>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create default state for a chat unless it already exists.
    ///
    /// Returns `true` if the chat was created. Known chats are left untouched.
    pub fn ensure_chat(&self, chat_id: ChatId, kind: ChatKind) -> bool {
        match self.chats.entry(chat_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(ChatPolicy::new(kind))));
                info!("Initialized moderation policy for chat {}", chat_id);
                true
            }
        }
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.chats.contains_key(&chat_id)
    }

    /// Forget a chat entirely (bot removed from it).
    pub fn remove_chat(&self, chat_id: ChatId) -> bool {
        let removed = self.chats.remove(&chat_id).is_some();
        if removed {
            info!("Dropped moderation policy for chat {}", chat_id);
        }
        removed
    }

    /// Number of chats with moderation state.
    pub fn chat_count(&self) -> usize {
        self.chats.len()
    }

    /// Run `f` with exclusive access to one chat's policy.
    pub fn with_chat<R>(
        &self,
        chat_id: ChatId,
        f: impl FnOnce(&mut ChatPolicy) -> R,
    ) -> ModerationResult<R> {
        // Clone the handle out so the map shard is released before locking.
        let handle = self
            .chats
            .get(&chat_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ModerationError::UnknownChat(chat_id))?;

        let mut policy = handle.lock();
        Ok(f(&mut policy))
    }

    /// Consistent copy of a chat's policy.
    pub fn snapshot(&self, chat_id: ChatId) -> ModerationResult<ChatPolicy> {
        self.with_chat(chat_id, |policy| policy.clone())
    }

    /// Kind the chat was first registered as.
    pub fn kind(&self, chat_id: ChatId) -> ModerationResult<ChatKind> {
        self.with_chat(chat_id, |policy| policy.kind)
    }

    pub fn rule(&self, chat_id: ChatId, category: RuleCategory) -> ModerationResult<CategoryRule> {
        self.with_chat(chat_id, |policy| policy.rule(category).clone())
    }

    /// Atomic read-modify-write of one rule; returns the updated rule.
    pub fn update_rule(
        &self,
        chat_id: ChatId,
        category: RuleCategory,
        mutator: impl FnOnce(&mut CategoryRule),
    ) -> ModerationResult<CategoryRule> {
        let rule = self.with_chat(chat_id, |policy| {
            let rule = policy.rule_mut(category);
            mutator(rule);
            rule.normalize();
            rule.clone()
        })?;

        info!(
            "Rule {} in chat {} now enabled={} action={} duration={} threshold={} after={}",
            category,
            chat_id,
            rule.enabled,
            rule.action,
            rule.duration,
            rule.warn_threshold,
            rule.post_warn_action.as_str()
        );
        Ok(rule)
    }

    /// Add one keyword (lower-cased). Returns `false` for blanks and duplicates.
    pub fn add_custom_keyword(&self, chat_id: ChatId, keyword: &str) -> ModerationResult<bool> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Ok(false);
        }
        let added = self.with_chat(chat_id, |policy| policy.keywords.insert(keyword.clone()))?;
        if added {
            debug!("Added keyword '{}' in chat {}", keyword, chat_id);
        }
        Ok(added)
    }

    pub fn remove_custom_keyword(&self, chat_id: ChatId, keyword: &str) -> ModerationResult<bool> {
        let keyword = keyword.trim().to_lowercase();
        self.with_chat(chat_id, |policy| policy.keywords.remove(&keyword))
    }

    /// Remove every keyword, returning how many were dropped.
    pub fn clear_custom_keywords(&self, chat_id: ChatId) -> ModerationResult<usize> {
        self.with_chat(chat_id, |policy| {
            let count = policy.keywords.len();
            policy.keywords.clear();
            count
        })
    }

    pub fn custom_keywords(&self, chat_id: ChatId) -> ModerationResult<Vec<String>> {
        self.with_chat(chat_id, |policy| policy.keywords.iter().cloned().collect())
    }

    /// Exempt a domain from the link rule. Returns `false` if already allowed.
    pub fn allow_domain(&self, chat_id: ChatId, domain: &str) -> ModerationResult<bool> {
        let domain = normalize_domain(domain);
        if domain.is_empty() {
            return Err(ModerationError::InvalidInput("empty domain".to_string()));
        }
        self.with_chat(chat_id, |policy| policy.allowed_domains.insert(domain))
    }

    pub fn block_domain(&self, chat_id: ChatId, domain: &str) -> ModerationResult<bool> {
        let domain = normalize_domain(domain);
        self.with_chat(chat_id, |policy| policy.allowed_domains.remove(&domain))
    }

    pub fn allowed_domains(&self, chat_id: ChatId) -> ModerationResult<Vec<String>> {
        self.with_chat(chat_id, |policy| {
            policy.allowed_domains.iter().cloned().collect()
        })
    }

    /// Increment a user's warning count and return the new value.
    pub fn record_warning(&self, chat_id: ChatId, user_id: UserId) -> ModerationResult<u32> {
        self.with_chat(chat_id, |policy| {
            let count = policy.warnings.entry(user_id).or_insert(0);
            *count += 1;
            *count
        })
    }

    pub fn reset_warnings(&self, chat_id: ChatId, user_id: UserId) -> ModerationResult<()> {
        self.with_chat(chat_id, |policy| {
            policy.warnings.remove(&user_id);
        })
    }

    /// Shift a warning count by `delta`, never going below zero.
    pub fn adjust_warning(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        delta: i32,
    ) -> ModerationResult<u32> {
        self.with_chat(chat_id, |policy| {
            let current = policy.warning_count(user_id);
            let updated = current.saturating_add_signed(delta);
            if updated == 0 {
                policy.warnings.remove(&user_id);
            } else {
                policy.warnings.insert(user_id, updated);
            }
            updated
        })
    }

    pub fn warnings(&self, chat_id: ChatId, user_id: UserId) -> ModerationResult<u32> {
        self.with_chat(chat_id, |policy| policy.warning_count(user_id))
    }
}

/// Lower-case a domain and strip scheme, `www.` and any path.
pub fn normalize_domain(input: &str) -> String {
    let lower = input.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .to_string()
}

//! Pending admin input, expiring after inactivity.

use std::time::Duration;

use teloxide::types::{ChatId, UserId};
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};

/// What the next plain-text message from an admin will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInput {
    CustomKeywords { chat_id: ChatId },
}

/// Per-admin input sessions. At most one per admin; a new one replaces the old.
#[derive(Clone)]
pub struct ConfigSessions {
    cache: TypedCache<UserId, PendingInput>,
}

impl ConfigSessions {
    pub fn new(registry: &CacheRegistry, idle: Duration) -> Self {
        Self {
            cache: registry.get_or_create("config_sessions", CacheConfig::session(idle)),
        }
    }

    pub fn begin(&self, admin: UserId, pending: PendingInput) {
        debug!("Admin {} now entering {:?}", admin, pending);
        self.cache.insert(admin, pending);
    }

    pub fn pending(&self, admin: UserId) -> Option<PendingInput> {
        self.cache.get(&admin)
    }

    /// Remove and return the admin's session.
    pub fn take(&self, admin: UserId) -> Option<PendingInput> {
        self.cache.take(&admin)
    }
}

//! Admin checker with caching.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use teloxide::types::{ChatId, UserId};
use tracing::{debug, warn};

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::error::ModerationResult;
use crate::moderation::ChatAdapter;

/// Admin sets for a chat, cached with a TTL.
type AdminSet = Arc<HashSet<UserId>>;

/// Cached admin lookups.
///
/// Bot owners (from OWNER_IDS env) are admins everywhere.
#[derive(Clone)]
pub struct AdminCache {
    adapter: Arc<dyn ChatAdapter>,
    cache: TypedCache<ChatId, AdminSet>,
    owner_ids: Arc<[u64]>,
}

impl AdminCache {
    pub fn new(
        adapter: Arc<dyn ChatAdapter>,
        registry: &CacheRegistry,
        ttl: Duration,
        owner_ids: Vec<u64>,
    ) -> Self {
        let cache = registry.get_or_create("admin_cache", CacheConfig::admin_lookup(ttl));
        Self {
            adapter,
            cache,
            owner_ids: owner_ids.into(),
        }
    }

    #[inline]
    pub fn is_bot_owner(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    /// Check if a user is an admin of a chat.
    ///
    /// A failed lookup counts as "not an admin" so nothing is unlocked on errors.
    pub async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> bool {
        if self.is_bot_owner(user_id) {
            debug!("User {} is bot owner, treating as admin", user_id);
            return true;
        }

        if let Some(admins) = self.cache.get(&chat_id) {
            return admins.contains(&user_id);
        }

        debug!("Admin cache miss for chat {}", chat_id);
        match self.refresh(chat_id).await {
            Ok(admins) => admins.contains(&user_id),
            Err(e) => {
                warn!("Failed to load admins for chat {}: {}", chat_id, e);
                false
            }
        }
    }

    /// Reload a chat's admins from the platform.
    pub async fn refresh(&self, chat_id: ChatId) -> ModerationResult<AdminSet> {
        let admins: AdminSet = Arc::new(self.adapter.list_admins(chat_id).await?);
        debug!("Cached {} admins for chat {}", admins.len(), chat_id);
        self.cache.insert(chat_id, Arc::clone(&admins));
        Ok(admins)
    }

    /// Drop a chat's cached admins. Call when admin status may have changed.
    pub fn invalidate(&self, chat_id: ChatId) {
        self.cache.invalidate(&chat_id);
        debug!("Invalidated admin cache for chat {}", chat_id);
    }
}

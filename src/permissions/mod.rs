//! Admin checks for moderation and settings.
//!
//! Admin sets are fetched per chat through the chat adapter and cached with
//! a TTL, so a busy group costs one lookup per expiry window.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let admins = AdminCache::new(adapter, &registry, ttl, owner_ids);
//!
//! if admins.is_admin(chat_id, user_id).await {
//!     // ...
//! }
//! ```

mod checker;

pub use checker::AdminCache;

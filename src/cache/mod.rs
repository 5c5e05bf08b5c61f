//! Named caches built on Moka.
//!
//! - `CacheRegistry` - holds every named cache so components share them
//! - `TypedCache` - thin typed wrapper over a Moka cache
//! - `CacheConfig` - capacity and expiry settings
//!
//! The moderation core uses two caches: the per-chat admin sets
//! (`admin_cache`, TTL-bounded staleness) and pending settings input
//! (`config_sessions`, idle expiry).

mod config;
mod registry;
mod typed;

pub use config::CacheConfig;
pub use registry::CacheRegistry;
pub use typed::TypedCache;

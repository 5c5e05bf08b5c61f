//! Cache registry - Central management for all caches.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{CacheConfig, TypedCache};

/// Registry of named caches.
///
/// Components ask for a cache by name; the first caller's config wins and
/// later callers share the same storage.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

/// Type-erased cache plus the type it was created with.
struct CacheEntry {
    cache: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an existing cache or create it with `config`.
    ///
    /// # Panics
    /// Panics if `name` is already registered with different key/value types.
    pub fn get_or_create<K, V>(&self, name: &str, config: CacheConfig) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        if let Some(cache) = self.get(name) {
            return cache;
        }

        let mut caches = self.caches.write();
        // Another caller may have won the race between the read and the write lock.
        if let Some(existing) = caches.get(name) {
            return Self::downcast(name, existing);
        }

        debug!("Creating cache: {}", name);
        let cache = TypedCache::new(name, config);
        caches.insert(
            name.to_string(),
            CacheEntry {
                cache: Box::new(cache.clone()),
                type_id: TypeId::of::<TypedCache<K, V>>(),
                type_name: std::any::type_name::<TypedCache<K, V>>(),
            },
        );
        cache
    }

    /// Get an existing cache by name.
    ///
    /// # Panics
    /// Panics if the cache exists with different key/value types.
    pub fn get<K, V>(&self, name: &str) -> Option<TypedCache<K, V>>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        self.caches
            .read()
            .get(name)
            .map(|entry| Self::downcast(name, entry))
    }

    fn downcast<K, V>(name: &str, entry: &CacheEntry) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        match entry.cache.downcast_ref::<TypedCache<K, V>>() {
            Some(cache) if entry.type_id == TypeId::of::<TypedCache<K, V>>() => cache.clone(),
            _ => panic!(
                "Cache '{}' type mismatch: expected {}, got {}",
                name,
                std::any::type_name::<TypedCache<K, V>>(),
                entry.type_name
            ),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.caches.read().contains_key(name)
    }

    pub fn cache_names(&self) -> Vec<String> {
        self.caches.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("cache_count", &caches.len())
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::CacheError;

/// A persistent key-value store for space-level metadata.
///
/// Caches operate on raw bytes; encoding is handled by the repository.
/// Implementations bring their own thread-safety, so all methods take `&self`.
pub trait DurableCache {
    /// Retrieves the bytes stored under a key, or None if not present.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores bytes under the given key.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Checks whether a key exists in the cache.
    fn has(&self, key: &str) -> Result<bool, CacheError>;
}

impl<C: DurableCache + ?Sized> DurableCache for Rc<C> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        (**self).set(key, value)
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        (**self).has(key)
    }
}

impl<C: DurableCache + ?Sized> DurableCache for Arc<C> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        (**self).set(key, value)
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        (**self).has(key)
    }
}

/// An in-process cache backed by a HashMap.
///
/// Useful for testing and for sharing warmed metadata between clients.
#[derive(Debug, Default)]
pub struct MemoryCache {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurableCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_set_get() {
        let cache = MemoryCache::new();
        cache.set("hydrazine.s.master.space.s", b"hello world").unwrap();

        let retrieved = cache.get("hydrazine.s.master.space.s").unwrap();
        assert_eq!(retrieved, Some(b"hello world".to_vec()));
    }

    #[test]
    fn memory_cache_get_missing() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn memory_cache_has() {
        let cache = MemoryCache::new();
        assert!(!cache.has("key").unwrap());

        cache.set("key", b"value").unwrap();

        assert!(cache.has("key").unwrap());
    }

    #[test]
    fn memory_cache_overwrite() {
        let cache = MemoryCache::new();
        cache.set("key", b"first").unwrap();
        cache.set("key", b"second").unwrap();

        assert_eq!(cache.get("key").unwrap(), Some(b"second".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn shared_handle_sees_writes() {
        let cache = Arc::new(MemoryCache::new());
        let handle: Box<dyn DurableCache> = Box::new(Arc::clone(&cache));

        handle.set("key", b"value").unwrap();

        assert!(cache.has("key").unwrap());
    }
}

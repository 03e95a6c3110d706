//! Cache backend implementations.

use super::key::CacheKey;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct StoredEntry {
    data: Vec<u8>,
    inserted_at: Instant,
    ttl: Duration,
}

impl StoredEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Storage seam for the TTL cache: bytes in, bytes out, expiry enforced by
/// the store.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &CacheKey) -> Result<bool>;
    async fn exists(&self, key: &CacheKey) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

/// In-process store: LRU-bounded map with per-entry TTL.
///
/// Expired entries drop on the next read of their key; writes past capacity
/// evict the least-recently-used entry, so memory stays bounded even for
/// keys that are written once and never read again.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, StoredEntry>>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            Error::configuration_with_context(
                "capacity must be positive",
                ErrorContext::new()
                    .with_field_path("cache.capacity")
                    .with_source("memory_store"),
            )
        })?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, StoredEntry>> {
        // Entries are plain data; a panic mid-operation cannot leave them
        // torn, so a poisoned lock is recoverable.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CacheBackend for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let mut entries = self.lock();
        let expired = matches!(entries.get(&key.hash), Some(e) if e.is_expired());
        if expired {
            entries.pop(&key.hash);
            return Ok(None);
        }
        Ok(entries.get(&key.hash).map(|e| e.data.clone()))
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<()> {
        let mut entries = self.lock();
        entries.put(key.hash.clone(), StoredEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.lock().pop(&key.hash).is_some())
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        let mut entries = self.lock();
        Ok(matches!(entries.get(&key.hash), Some(e) if !e.is_expired()))
    }

    async fn clear(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.lock().iter().filter(|(_, e)| !e.is_expired()).count())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> CacheKey {
        CacheKey::new("test", s)
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(MemoryStore::new(0).is_err());
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = MemoryStore::new(8).unwrap();
        store
            .set(&key("a"), b"payload", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            store.get(&key("a")).await.unwrap(),
            Some(b"payload".to_vec())
        );
        assert!(store.exists(&key("a")).await.unwrap());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let store = MemoryStore::new(8).unwrap();
        store
            .set(&key("a"), b"stale", Duration::from_millis(30))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get(&key("a")).await.unwrap(), None);
        assert!(!store.exists(&key("a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let store = MemoryStore::new(2).unwrap();
        let ttl = Duration::from_secs(60);
        store.set(&key("a"), b"1", ttl).await.unwrap();
        store.set(&key("b"), b"2", ttl).await.unwrap();
        // Touch "a" so "b" is the LRU victim.
        store.get(&key("a")).await.unwrap();
        store.set(&key("c"), b"3", ttl).await.unwrap();

        assert!(store.get(&key("a")).await.unwrap().is_some());
        assert!(store.get(&key("b")).await.unwrap().is_none());
        assert!(store.get(&key("c")).await.unwrap().is_some());
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = MemoryStore::new(8).unwrap();
        let ttl = Duration::from_secs(60);
        store.set(&key("a"), b"1", ttl).await.unwrap();
        store.set(&key("b"), b"2", ttl).await.unwrap();

        assert!(store.delete(&key("a")).await.unwrap());
        assert!(!store.delete(&key("a")).await.unwrap());

        store.clear().await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
    }
}

//! Typed TTL cache over a pluggable backend.

use super::backend::{CacheBackend, MemoryStore};
use super::key::CacheKeyGenerator;
use crate::{Error, ErrorContext, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TtlCacheConfig {
    /// Maximum entry age before a read treats it as a miss.
    pub ttl: Duration,
    /// Upper bound on stored entries; writes past it evict LRU.
    pub capacity: usize,
    pub enabled: bool,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            capacity: 1024,
            enabled: true,
        }
    }
}

impl TtlCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(Error::configuration_with_context(
                "ttl must be positive",
                ErrorContext::new().with_field_path("cache.ttl"),
            ));
        }
        if self.capacity == 0 {
            return Err(Error::configuration_with_context(
                "capacity must be positive",
                ErrorContext::new().with_field_path("cache.capacity"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Memoizes expensive operations keyed by their serialized arguments, for a
/// bounded time window.
///
/// A failing compute is never cached: the error propagates and the next call
/// re-invokes the operation.
pub struct TtlCache {
    config: TtlCacheConfig,
    backend: Box<dyn CacheBackend>,
    keys: CacheKeyGenerator,
    stats: Arc<AtomicStats>,
}

impl TtlCache {
    /// Cache backed by the in-process LRU store.
    pub fn in_memory(config: TtlCacheConfig) -> Result<Self> {
        let backend = Box::new(MemoryStore::new(config.capacity.max(1))?);
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: TtlCacheConfig, backend: Box<dyn CacheBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            keys: CacheKeyGenerator::new(),
            stats: Arc::new(AtomicStats::new()),
        })
    }

    pub fn with_key_salt(mut self, salt: impl Into<String>) -> Self {
        self.keys = CacheKeyGenerator::new().with_salt(salt);
        self
    }

    /// Return the cached value for `(op, args)` if present and fresh;
    /// otherwise await `compute`, store its result, and return it.
    pub async fn get_or_compute<A, V, C, Fut>(&self, op: &str, args: &A, compute: C) -> Result<V>
    where
        A: Serialize + ?Sized,
        V: Serialize + DeserializeOwned,
        C: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let key = self.keys.generate(op, args)?;
        if self.config.enabled {
            match self.backend.get(&key).await {
                Ok(Some(data)) => match serde_json::from_slice(&data) {
                    Ok(value) => {
                        self.stats.hits.fetch_add(1, Ordering::Relaxed);
                        return Ok(value);
                    }
                    Err(_) => {
                        // Undecodable entry: treat as a miss and recompute.
                        self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    }
                },
                Ok(None) => {
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    return Err(e);
                }
            }
        }

        let value = compute().await?;
        if self.config.enabled {
            let data = serde_json::to_vec(&value)?;
            self.backend.set(&key, &data, self.config.ttl).await?;
            self.stats.sets.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    /// Read a fresh entry without computing anything on a miss.
    pub async fn get<A, V>(&self, op: &str, args: &A) -> Result<Option<V>>
    where
        A: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        if !self.config.enabled {
            return Ok(None);
        }
        let key = self.keys.generate(op, args)?;
        match self.backend.get(&key).await? {
            Some(data) => match serde_json::from_slice(&data) {
                Ok(value) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    Ok(Some(value))
                }
                Err(_) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    Ok(None)
                }
            },
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    pub async fn insert<A, V>(&self, op: &str, args: &A, value: &V) -> Result<()>
    where
        A: Serialize + ?Sized,
        V: Serialize,
    {
        if !self.config.enabled {
            return Ok(());
        }
        let key = self.keys.generate(op, args)?;
        let data = serde_json::to_vec(value)?;
        self.backend.set(&key, &data, self.config.ttl).await?;
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub async fn remove<A>(&self, op: &str, args: &A) -> Result<bool>
    where
        A: Serialize + ?Sized,
    {
        let key = self.keys.generate(op, args)?;
        self.backend.delete(&key).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }

    /// Number of fresh entries currently stored.
    pub async fn len(&self) -> Result<usize> {
        self.backend.len().await
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn cache(ttl: Duration) -> TtlCache {
        TtlCache::in_memory(TtlCacheConfig::new().with_ttl(ttl).with_capacity(16)).unwrap()
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(TtlCache::in_memory(TtlCacheConfig::new().with_ttl(Duration::ZERO)).is_err());
        assert!(TtlCache::in_memory(TtlCacheConfig::new().with_capacity(0)).is_err());
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_hits_cache() {
        let cache = cache(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: u32 = cache
                .get_or_compute("op", &7u32, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(99)
                })
                .await
                .unwrap();
            assert_eq!(value, 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.hit_ratio(), 0.5);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputes() {
        let cache = cache(Duration::from_millis(40));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let _: u32 = cache
                .get_or_compute("op", &7u32, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(99)
                })
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(60)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_compute_is_not_cached() {
        let cache = cache(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let first: Result<u32> = cache
            .get_or_compute("op", &7u32, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::runtime("remote unavailable"))
            })
            .await;
        assert!(first.is_err());

        // Immediate retry must re-invoke the operation.
        let second: u32 = cache
            .get_or_compute("op", &7u32, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            })
            .await
            .unwrap();
        assert_eq!(second, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_args_are_distinct_entries() {
        let cache = cache(Duration::from_secs(60));
        let a: u32 = cache
            .get_or_compute("op", &1u32, || async { Ok(10) })
            .await
            .unwrap();
        let b: u32 = cache
            .get_or_compute("op", &2u32, || async { Ok(20) })
            .await
            .unwrap();
        assert_eq!((a, b), (10, 20));
        assert_eq!(cache.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_computes() {
        let cache = TtlCache::in_memory(TtlCacheConfig::new().with_enabled(false)).unwrap();
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let _: u32 = cache
                .get_or_compute("op", &7u32, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(99)
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_explicit_insert_get_remove() {
        let cache = cache(Duration::from_secs(60));
        cache.insert("op", &1u32, &"hello").await.unwrap();
        let hit: Option<String> = cache.get("op", &1u32).await.unwrap();
        assert_eq!(hit.as_deref(), Some("hello"));

        assert!(cache.remove("op", &1u32).await.unwrap());
        let gone: Option<String> = cache.get("op", &1u32).await.unwrap();
        assert!(gone.is_none());
    }
}

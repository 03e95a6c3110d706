//! # TTL Memoization Module
//!
//! This module avoids recomputation of expensive operations, keyed by their
//! argument values, for a bounded time window.
//!
//! ## Overview
//!
//! Collection pipelines ask the same questions repeatedly (entity lookups,
//! membership snapshots) while paying per call in rate budget and latency.
//! The cache provides:
//! - Stable keys derived from serialized arguments
//! - Per-entry TTL: stale reads are misses and trigger recomputation
//! - A hard capacity bound with LRU eviction, so write-once keys cannot
//!   accumulate indefinitely
//! - No negative caching: a failing compute stores nothing and is retried
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TtlCache`] | Typed memoization layer with hit/miss statistics |
//! | [`TtlCacheConfig`] | TTL, capacity, and enable/disable switches |
//! | [`CacheBackend`] | Trait for implementing custom stores |
//! | [`MemoryStore`] | In-process LRU-bounded store |
//! | [`CacheKey`], [`CacheKeyGenerator`] | Stable key derivation |
//!
//! ## Example
//!
//! ```rust
//! use paceline::cache::{TtlCache, TtlCacheConfig};
//! use std::time::Duration;
//!
//! # async fn demo() -> paceline::Result<()> {
//! let cache = TtlCache::in_memory(
//!     TtlCacheConfig::new()
//!         .with_ttl(Duration::from_secs(300))
//!         .with_capacity(512),
//! )?;
//!
//! let members: Vec<String> = cache
//!     .get_or_compute("group_members", &42u64, || async {
//!         // expensive remote enumeration happens here on a miss
//!         Ok(vec!["alice".to_string(), "bob".to_string()])
//!     })
//!     .await?;
//! # let _ = members;
//! # Ok(())
//! # }
//! ```

mod backend;
mod key;
mod store;

pub use backend::{CacheBackend, MemoryStore};
pub use key::{CacheKey, CacheKeyGenerator};
pub use store::{CacheStats, TtlCache, TtlCacheConfig};

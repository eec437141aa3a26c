//! TTL response cache with an injected clock

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::ops::compute::Op;
use moka::Expiry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;

/// A cached value and the moment it stops being servable
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: DateTime<Utc>,
    ttl: Duration,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Lets moka reclaim an entry once its own TTL has run out.
struct EntryExpiry;

impl<V> Expiry<String, CacheEntry<V>> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-wide cache keyed by request URL.
///
/// Freshness is decided against the injected [`Clock`] on every read, so an
/// entry is never returned at or past its `expires_at`. Each `set` replaces
/// the whole entry; readers see either the old or the new one.
pub struct TtlCache<V> {
    entries: Cache<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self {
            entries,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a value if it is still fresh
    pub async fn get(&self, key: &str) -> Option<V> {
        let Some(entry) = self.entries.get(key).await else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let now = self.clock.now();
        if now >= entry.expires_at {
            debug!(key, expires_at = %entry.expires_at, "Cache entry expired");
            self.remove_if_expires_at(key, entry.expires_at).await;
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.value)
    }

    /// Store a value, replacing any previous entry for the key
    pub async fn set(&self, key: &str, value: V, ttl: Duration) {
        let lifetime =
            chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::weeks(52));
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now() + lifetime,
            ttl,
        };
        self.entries.insert(key.to_string(), entry).await;
    }

    /// When the entry for a key expires, if there is one
    pub async fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).await.map(|e| e.expires_at)
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    /// Drop the entry for `key` only if it is still the one that expires at
    /// `expires_at`; a value written since then is kept.
    async fn remove_if_expires_at(&self, key: &str, expires_at: DateTime<Utc>) {
        self.entries
            .entry(key.to_string())
            .and_compute_with(|current| async move {
                match current {
                    Some(current) if current.value().expires_at == expires_at => Op::Remove,
                    _ => Op::Nop,
                }
            })
            .await;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

//! Bounded, time-expiring cache of playable resources.
//!
//! Keyed by source-file fingerprint. Eviction uses insertion time, not
//! last-access time: a deliberate FIFO/TTL hybrid rather than true LRU
//! (`get` does not refresh `created_at`). Every handle placed in the cache
//! is released exactly once, on expiry, capacity eviction, overwrite,
//! explicit removal or teardown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use vplay_models::{Fingerprint, ResourceHandle};

use crate::config::PlayerConfig;

/// A cached playable resource.
#[derive(Debug)]
pub struct CachedResource {
    /// Handle owned exclusively by the cache until eviction
    pub handle: ResourceHandle,
    /// Insertion time; the eviction and expiry key
    pub created_at: Instant,
}

/// Bounded map from fingerprint to playable resource.
#[derive(Debug)]
pub struct ResourceCache {
    entries: HashMap<Fingerprint, CachedResource>,
    max_entries: usize,
    ttl: Duration,
}

/// Cache shared across pipeline instances on the cooperative scheduler.
pub type SharedCache = Arc<Mutex<ResourceCache>>;

impl ResourceCache {
    /// Create a cache with explicit limits.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        assert!(max_entries > 0, "cache requires room for at least one entry");
        Self {
            entries: HashMap::new(),
            max_entries,
            ttl,
        }
    }

    /// Create a cache from pipeline configuration.
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(config.max_cache_entries, config.cache_ttl())
    }

    /// Create a shareable cache from pipeline configuration.
    pub fn shared(config: &PlayerConfig) -> SharedCache {
        Arc::new(Mutex::new(Self::from_config(config)))
    }

    /// Look up a non-expired resource.
    ///
    /// An expired entry is removed and its handle released as part of this
    /// call, then reported as absent.
    pub fn get(&mut self, fingerprint: &Fingerprint) -> Option<ResourceHandle> {
        let created_at = self.entries.get(fingerprint)?.created_at;
        if created_at.elapsed() > self.ttl {
            let entry = self
                .entries
                .remove(fingerprint)
                .expect("entry present above");
            entry.handle.release();
            debug!(%fingerprint, "cache entry expired");
            return None;
        }
        Some(self.entries[fingerprint].handle.clone())
    }

    /// Insert a resource, evicting as needed.
    ///
    /// Overwriting an existing fingerprint releases the old handle first.
    /// At capacity, the entry with the smallest `created_at` is released
    /// and removed before the insert.
    pub fn put(&mut self, fingerprint: Fingerprint, handle: ResourceHandle) {
        if let Some(old) = self.entries.remove(&fingerprint) {
            old.handle.release();
            debug!(%fingerprint, "cache entry overwritten");
        } else if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }
        self.entries.insert(
            fingerprint,
            CachedResource {
                handle,
                created_at: Instant::now(),
            },
        );
    }

    /// Remove and release a specific entry. Returns whether it existed.
    pub fn remove(&mut self, fingerprint: &Fingerprint) -> bool {
        match self.entries.remove(fingerprint) {
            Some(entry) => {
                entry.handle.release();
                debug!(%fingerprint, "cache entry removed");
                true
            }
            None => false,
        }
    }

    /// Remove and release all expired entries. Returns how many went.
    pub fn sweep(&mut self) -> usize {
        let expired: Vec<Fingerprint> = self
            .entries
            .iter()
            .filter(|(_, e)| e.created_at.elapsed() > self.ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for fingerprint in &expired {
            if let Some(entry) = self.entries.remove(fingerprint) {
                entry.handle.release();
            }
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "swept expired cache entries");
        }
        expired.len()
    }

    /// Release everything; used on subsystem teardown.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        for (_, entry) in self.entries.drain() {
            entry.handle.release();
        }
        count
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a fingerprint is present (expiry not consulted).
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.created_at)
            .map(|(k, _)| k.clone());
        if let Some(fingerprint) = oldest {
            if let Some(entry) = self.entries.remove(&fingerprint) {
                entry.handle.release();
                debug!(%fingerprint, "cache entry evicted at capacity");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(n: usize) -> Fingerprint {
        Fingerprint::from_string(format!("file-{}.mp4:{}:0", n, n))
    }

    fn handle() -> ResourceHandle {
        ResourceHandle::new(vec![0u8; 4])
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_never_exceeded_and_oldest_evicted() {
        let mut cache = ResourceCache::new(10, Duration::from_secs(1800));
        let mut handles = Vec::new();

        for n in 0..11 {
            let h = handle();
            handles.push(h.clone());
            cache.put(fp(n), h);
            assert!(cache.len() <= 10);
            // Distinct insertion times so eviction order is well defined.
            tokio::time::advance(Duration::from_millis(1)).await;
        }

        assert_eq!(cache.len(), 10);
        assert!(!cache.contains(&fp(0)), "first-inserted entry must be gone");
        assert_eq!(handles[0].release_count(), 1);
        for h in &handles[1..] {
            assert_eq!(h.release_count(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_releases_on_get() {
        let ttl = Duration::from_secs(1800);
        let mut cache = ResourceCache::new(10, ttl);
        let h = handle();
        cache.put(fp(1), h.clone());

        tokio::time::advance(ttl + Duration::from_millis(1)).await;

        assert!(cache.get(&fp(1)).is_none());
        assert!(!cache.contains(&fp(1)));
        assert_eq!(h.release_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_within_ttl_returns_live_handle() {
        let mut cache = ResourceCache::new(10, Duration::from_secs(1800));
        let h = handle();
        cache.put(fp(1), h.clone());

        tokio::time::advance(Duration::from_secs(60)).await;

        let got = cache.get(&fp(1)).expect("entry still live");
        assert_eq!(got, h);
        assert_eq!(h.release_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_releases_old_handle_only() {
        let mut cache = ResourceCache::new(10, Duration::from_secs(1800));
        let old = handle();
        let new = handle();
        cache.put(fp(1), old.clone());
        cache.put(fp(1), new.clone());

        assert_eq!(cache.len(), 1);
        assert_eq!(old.release_count(), 1);
        assert_eq!(new.release_count(), 0);
        assert_eq!(cache.get(&fp(1)), Some(new));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_releases_only_expired() {
        let ttl = Duration::from_secs(1800);
        let mut cache = ResourceCache::new(10, ttl);
        let old = handle();
        cache.put(fp(1), old.clone());

        tokio::time::advance(ttl / 2).await;
        let young = handle();
        cache.put(fp(2), young.clone());

        tokio::time::advance(ttl / 2 + Duration::from_secs(1)).await;

        assert_eq!(cache.sweep(), 1);
        assert_eq!(old.release_count(), 1);
        assert_eq!(young.release_count(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_exactly_once_across_all_paths() {
        let ttl = Duration::from_secs(1800);
        let mut cache = ResourceCache::new(2, ttl);

        let expired = handle();
        let evicted = handle();
        let overwritten = handle();
        let removed = handle();
        let torn_down = handle();

        // Expiry via get.
        cache.put(fp(1), expired.clone());
        tokio::time::advance(ttl + Duration::from_secs(1)).await;
        cache.get(&fp(1));

        // Capacity eviction.
        cache.put(fp(2), evicted.clone());
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.put(fp(3), handle());
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.put(fp(4), handle());

        // Overwrite.
        cache.put(fp(5), overwritten.clone());
        cache.put(fp(5), handle());

        // Explicit remove.
        cache.put(fp(6), removed.clone());
        cache.remove(&fp(6));

        // Teardown.
        cache.put(fp(7), torn_down.clone());
        cache.clear();
        assert!(cache.is_empty());

        for h in [&expired, &evicted, &overwritten, &removed, &torn_down] {
            assert_eq!(h.release_count(), 1, "every path releases exactly once");
        }
    }
}

use crate::{CacheLookup, CacheStats, CachedGraph, GraphCache, ProjectKey};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Like [`InMemoryGraphCache`](crate::InMemoryGraphCache), but entries expire
/// `ttl` after they were built.
///
/// Expired entries read as misses and are removed on the read that finds
/// them, or in bulk by [`purge_expired`](Self::purge_expired).
#[derive(Debug)]
pub struct TtlGraphCache {
    entries: RwLock<HashMap<ProjectKey, CachedGraph>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
}

impl TtlGraphCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, entry: &CachedGraph, now: DateTime<Utc>) -> bool {
        // entries stamped in the future have a negative age and are kept
        (now - entry.built_at)
            .to_std()
            .is_ok_and(|age| age >= self.ttl)
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let purged = before - entries.len();
        if purged > 0 {
            self.expirations.fetch_add(purged as u64, Ordering::Relaxed);
            debug!(purged, "purged expired graphs");
        }
        purged
    }
}

impl GraphCache for TtlGraphCache {
    fn get(&self, key: &ProjectKey) -> CacheLookup {
        let now = Utc::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !self.is_expired(entry, now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return CacheLookup::Hit(entry.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return CacheLookup::Miss;
                }
            }
        }

        // Expired. Re-check under the write lock: a writer may have replaced it.
        let mut entries = self.entries.write();
        if entries
            .get(key)
            .is_some_and(|entry| self.is_expired(entry, now))
        {
            entries.remove(key);
            self.expirations.fetch_add(1, Ordering::Relaxed);
            debug!(project = %key, "cached graph expired");
        } else if let Some(entry) = entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return CacheLookup::Hit(entry.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        CacheLookup::Miss
    }

    fn put(&self, key: ProjectKey, entry: CachedGraph) {
        debug!(project = %key, nodes = entry.graph.node_count(), "caching graph");
        self.entries.write().insert(key, entry);
    }

    fn invalidate(&self, key: &ProjectKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    /// Stored entries, including expired ones not yet purged.
    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

use crate::{CacheLookup, CacheStats, CachedGraph, GraphCache, ProjectKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Entries live until invalidated.
///
/// A single reader/writer lock guards the map: lookups share it, writes take
/// it exclusively, so a reader sees either the old or the new entry.
#[derive(Debug, Default)]
pub struct InMemoryGraphCache {
    entries: RwLock<HashMap<ProjectKey, CachedGraph>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryGraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<ProjectKey> {
        let mut keys: Vec<ProjectKey> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl GraphCache for InMemoryGraphCache {
    fn get(&self, key: &ProjectKey) -> CacheLookup {
        match self.entries.read().get(key) {
            Some(cached) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                CacheLookup::Hit(cached.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                CacheLookup::Miss
            }
        }
    }

    fn put(&self, key: ProjectKey, entry: CachedGraph) {
        debug!(project = %key, nodes = entry.graph.node_count(), "caching graph");
        self.entries.write().insert(key, entry);
    }

    fn invalidate(&self, key: &ProjectKey) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            debug!(project = %key, "invalidated cached graph");
        }
        removed
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: 0,
            entries: self.len(),
        }
    }
}

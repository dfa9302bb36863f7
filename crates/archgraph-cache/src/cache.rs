use archgraph_graph::ArchGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Identity of a project whose graph is cached: a path or any logical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(String);

impl ProjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ProjectKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&Path> for ProjectKey {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

/// A built graph and when it was built. Cloning shares the graph.
#[derive(Debug, Clone)]
pub struct CachedGraph {
    pub graph: Arc<ArchGraph>,
    pub built_at: DateTime<Utc>,
}

impl CachedGraph {
    pub fn new(graph: Arc<ArchGraph>) -> Self {
        Self::with_built_at(graph, Utc::now())
    }

    pub fn with_built_at(graph: Arc<ArchGraph>, built_at: DateTime<Utc>) -> Self {
        Self { graph, built_at }
    }

    /// Whether both entries share the same graph instance.
    pub fn same_graph(&self, other: &CachedGraph) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph)
    }
}

#[derive(Debug, Clone)]
pub enum CacheLookup {
    Hit(CachedGraph),
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    pub fn into_option(self) -> Option<CachedGraph> {
        match self {
            CacheLookup::Hit(cached) => Some(cached),
            CacheLookup::Miss => None,
        }
    }
}

/// Cache performance statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because their TTL elapsed.
    pub expirations: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}

/// Storage for built graphs keyed by project.
///
/// Implementations only store; they never build. Callers own the
/// get, build on miss, set sequence (see [`fetch_or_insert_with`]).
pub trait GraphCache: Send + Sync {
    fn get(&self, key: &ProjectKey) -> CacheLookup;

    /// Store an entry, replacing any previous one for the key.
    fn put(&self, key: ProjectKey, entry: CachedGraph);

    /// Store a graph stamped with the current time.
    fn set(&self, key: ProjectKey, graph: Arc<ArchGraph>) -> CachedGraph {
        let entry = CachedGraph::new(graph);
        self.put(key, entry.clone());
        entry
    }

    /// Remove the entry; returns whether one was present.
    fn invalidate(&self, key: &ProjectKey) -> bool;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats;
}

/// Return the cached graph for `key`, or run `build` on a miss and cache its result.
///
/// Concurrent callers missing on the same key may each build; the last
/// `set` wins. A failed build leaves the cache unchanged.
pub fn fetch_or_insert_with<C, F, E>(cache: &C, key: &ProjectKey, build: F) -> Result<CachedGraph, E>
where
    C: GraphCache + ?Sized,
    F: FnOnce() -> Result<ArchGraph, E>,
{
    if let CacheLookup::Hit(cached) = cache.get(key) {
        return Ok(cached);
    }
    let graph = build()?;
    Ok(cache.set(key.clone(), Arc::new(graph)))
}

//! Caching of built architecture graphs per project.
//!
//! The cache is pure storage behind the [`GraphCache`] trait. It never builds
//! graphs itself; pair it with a builder through [`fetch_or_insert_with`].

pub mod cache;
pub mod memory;
pub mod ttl;

pub use cache::{fetch_or_insert_with, CacheLookup, CacheStats, CachedGraph, GraphCache, ProjectKey};
pub use memory::InMemoryGraphCache;
pub use ttl::TtlGraphCache;

use archgraph_core::CacheConfig;
use std::time::Duration;

/// The cache described by `config`: TTL-based when `ttl_secs` is set, otherwise unbounded.
pub fn cache_from_config(config: &CacheConfig) -> Box<dyn GraphCache> {
    match config.ttl_secs {
        Some(secs) => Box::new(TtlGraphCache::new(Duration::from_secs(secs))),
        None => Box::new(InMemoryGraphCache::new()),
    }
}

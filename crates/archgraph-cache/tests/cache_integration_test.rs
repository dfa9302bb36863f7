use archgraph_cache::{
    cache_from_config, fetch_or_insert_with, CacheLookup, GraphCache, InMemoryGraphCache,
    ProjectKey, TtlGraphCache,
};
use archgraph_core::{ArchitectureModel, CacheConfig, Component, Container, System};
use archgraph_graph::{analyze_dependencies, build_graph};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn create_test_model() -> ArchitectureModel {
    ArchitectureModel::new("shop").with_system(
        System::new("Shop").with_container(
            Container::new("Api")
                .with_component(Component::new("Orders").with_relationship("payments", "charges"))
                .with_component(Component::new("Payments")),
        ),
    )
}

#[test]
fn test_fetch_builds_once_then_hits() {
    let cache = InMemoryGraphCache::new();
    let key = ProjectKey::from_path(Path::new("/work/shop"));
    let model = create_test_model();
    let builds = AtomicUsize::new(0);

    let build = || {
        builds.fetch_add(1, Ordering::SeqCst);
        build_graph(&model)
    };
    let first = fetch_or_insert_with(&cache, &key, build).unwrap();
    let second = fetch_or_insert_with(&cache, &key, || {
        builds.fetch_add(1, Ordering::SeqCst);
        build_graph(&model)
    })
    .unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(first.same_graph(&second));
    assert_eq!(analyze_dependencies(&second.graph).total_edges, 1);
}

#[test]
fn test_failed_build_leaves_cache_empty() {
    let cache = InMemoryGraphCache::new();
    let key = ProjectKey::from("broken");
    let result = fetch_or_insert_with(&cache, &key, || Err::<_, String>("no model".to_string()));
    assert_eq!(result.unwrap_err(), "no model");
    assert!(cache.is_empty());
}

#[test]
fn test_concurrent_readers_share_one_graph() {
    let cache = Arc::new(InMemoryGraphCache::new());
    let key = ProjectKey::from("shop");
    let stored = cache.set(key.clone(), Arc::new(build_graph(&create_test_model()).unwrap()));

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            let stored = stored.clone();
            scope.spawn(move || {
                for _ in 0..100 {
                    match cache.get(&key) {
                        CacheLookup::Hit(found) => {
                            assert!(found.same_graph(&stored));
                            assert_eq!(found.graph.get_dependents("shop/api/payments").len(), 1);
                        }
                        CacheLookup::Miss => panic!("entry vanished"),
                    }
                }
            });
        }
    });

    assert_eq!(cache.stats().hits, 800);
}

#[test]
fn test_writer_and_readers_interleave() {
    let cache = Arc::new(InMemoryGraphCache::new());
    let key = ProjectKey::from("shop");

    std::thread::scope(|scope| {
        let writer_cache = Arc::clone(&cache);
        let writer_key = key.clone();
        scope.spawn(move || {
            for _ in 0..50 {
                writer_cache.set(writer_key.clone(), Arc::new(build_graph(&create_test_model()).unwrap()));
                writer_cache.invalidate(&writer_key);
            }
        });
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    // either no entry or a complete graph, never a partial one
                    if let CacheLookup::Hit(found) = cache.get(&key) {
                        assert_eq!(found.graph.node_count(), 4);
                    }
                }
            });
        }
    });

    assert!(!cache.get(&key).is_hit());
}

#[test]
fn test_cache_from_config() {
    let unbounded = cache_from_config(&CacheConfig::default());
    let key = ProjectKey::from("shop");
    unbounded.set(key.clone(), Arc::new(build_graph(&create_test_model()).unwrap()));
    assert!(unbounded.get(&key).is_hit());

    let expiring = cache_from_config(&CacheConfig { ttl_secs: Some(0) });
    expiring.set(key.clone(), Arc::new(build_graph(&create_test_model()).unwrap()));
    assert!(!expiring.get(&key).is_hit());
}

#[test]
fn test_ttl_cache_is_a_drop_in_replacement() {
    let caches: Vec<Box<dyn GraphCache>> = vec![
        Box::new(InMemoryGraphCache::new()),
        Box::new(TtlGraphCache::new(Duration::from_secs(3600))),
    ];
    for cache in &caches {
        let key = ProjectKey::from("shop");
        let stored = fetch_or_insert_with(&**cache, &key, || build_graph(&create_test_model())).unwrap();
        assert!(cache.get(&key).into_option().unwrap().same_graph(&stored));
        assert!(cache.invalidate(&key));
        assert!(!cache.get(&key).is_hit());
    }
}

#[test]
fn test_project_key_serializes_as_string() {
    let key = ProjectKey::new("workspace/shop");
    assert_eq!(serde_json::to_string(&key).unwrap(), "\"workspace/shop\"");
    assert_eq!(key.to_string(), "workspace/shop");
}

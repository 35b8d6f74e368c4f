use criterion::{black_box, criterion_group, criterion_main, Criterion};
use refcache::adapters::cache::{NormalizingCache, TtlCache};
use refcache::domain::errors::DomainError;
use refcache::domain::paths::PathTransformation;
use refcache::domain::ports::{loader_fn, Cache};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

const TTL: Duration = Duration::from_secs(600);

fn id_cache() -> Arc<TtlCache<i64, Arc<String>>> {
    let loader = loader_fn(|id: i64| async move { Ok::<_, DomainError>(Arc::new(format!("space-{id}"))) });
    Arc::new(TtlCache::new("bench_id", loader, TTL))
}

fn path_cache() -> NormalizingCache<i64> {
    let loader = loader_fn(|path: String| async move { Ok::<_, DomainError>(path.len() as i64) });
    let inner: Arc<dyn Cache<String, i64>> = Arc::new(TtlCache::new("bench_path", loader, TTL));
    NormalizingCache::with_transformation(inner, PathTransformation::CaseInsensitive)
}

fn cache_hit_benchmarks(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("cache_hit");

    let ids = id_cache();
    rt.block_on(async {
        ids.get(&42).await.expect("warm id cache");
    });
    group.bench_function("id_cache_hit", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(ids.get(black_box(&42)).await.expect("hit"));
        })
    });

    let paths = path_cache();
    let key = "Acme/Team1/Project".to_string();
    rt.block_on(async {
        paths.get(&key).await.expect("warm path cache");
    });
    group.bench_function("normalized_path_hit", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(paths.get(black_box(&key)).await.expect("hit"));
        })
    });

    group.finish();
}

criterion_group!(benches, cache_hit_benchmarks);
criterion_main!(benches);

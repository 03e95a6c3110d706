use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use paceline::runner::TaskRunner;
use tokio::runtime::Runtime;

fn bench_run_all(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("runner");

    for limit in [1usize, 4, 16] {
        group.bench_with_input(
            BenchmarkId::new("run_all_256_ready_tasks", limit),
            &limit,
            |b, &limit| {
                b.to_async(&rt).iter(|| async move {
                    let runner = TaskRunner::new(limit).expect("limit is positive");
                    let results = runner
                        .run_all((0..256u32).map(|i| async move { Ok::<_, String>(i) }))
                        .await
                        .expect("run completes");
                    assert_eq!(results.len(), 256);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_run_all);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mocka::location::SourceLocation;
use mocka::store::{Store, UseCount};

fn loc() -> SourceLocation {
    SourceLocation { file: "bench", line: 0 }
}

fn bench_add_take(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_add_take");

    for size in [16usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut store: Store<u64> = Store::new();
                for i in 0..size {
                    store.add(&["f"], i as u64, UseCount::Exact(1), loc());
                }
                for _ in 0..size {
                    black_box(store.take(&["f"]));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add_take);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mocka::alloc::TrackingAllocator;

fn bench_alloc_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("alloc_free");

    for size in [16usize, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut allocator = TrackingAllocator::new();
            b.iter(|| {
                let ptr = allocator.alloc(size);
                black_box(ptr);
                allocator.free(ptr).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_alloc_free);
criterion_main!(benches);

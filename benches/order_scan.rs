use divan::black_box;

use mocka::location::SourceLocation;
use mocka::order::OrderingQueue;
use mocka::store::UseCount;

fn main() {
    divan::main();
}

fn loc() -> SourceLocation {
    SourceLocation { file: "bench", line: 0 }
}

#[divan::bench(args = [8, 64, 512])]
fn skip_sticky_scan(bencher: divan::Bencher, sticky_count: usize) {
    bencher
        .with_inputs(|| {
            let mut q = OrderingQueue::new();
            for _ in 0..sticky_count {
                q.expect("log", UseCount::Always, loc());
            }
            q.expect("target", UseCount::Exact(1), loc());
            q
        })
        .bench_local_values(|mut q| {
            black_box(q.record_call("target", loc())).unwrap();
        });
}

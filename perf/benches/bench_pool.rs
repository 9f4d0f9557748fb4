use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use turnstile_events::{CustomerId, VendorId};
use turnstile_perf::{contend, quiet_pool};

fn bench_release_purchase_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");
    group.throughput(Throughput::Elements(1));

    group.bench_function("release_purchase_cycle", |b| {
        b.iter_custom(|iters| {
            // Fresh pool per sample so capacity never runs out mid-measurement.
            let cap = u32::try_from(iters * 4 + 4).unwrap_or(u32::MAX);
            let pool = quiet_pool(0, cap);
            let start = std::time::Instant::now();
            for _ in 0..iters {
                black_box(pool.release(VendorId(1), black_box(4)));
                black_box(pool.purchase(CustomerId(1), black_box(3)));
            }
            start.elapsed()
        });
    });

    group.bench_function("snapshot", |b| {
        let pool = quiet_pool(10, 100);
        b.iter(|| black_box(pool.snapshot()));
    });

    group.bench_function("refused_release", |b| {
        let pool = quiet_pool(100, 100);
        b.iter(|| black_box(pool.release(VendorId(1), black_box(5))));
    });

    group.finish();
}

fn bench_contended_purchases(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_contended");
    group.sample_size(10);

    for &pairs in &[1u32, 2, 4, 8] {
        group.throughput(Throughput::Elements(u64::from(pairs) * 1_000));
        group.bench_with_input(BenchmarkId::from_parameter(pairs), &pairs, |b, &pairs| {
            b.iter(|| black_box(contend(pairs, 1_000)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_release_purchase_cycle, bench_contended_purchases);
criterion_main!(benches);

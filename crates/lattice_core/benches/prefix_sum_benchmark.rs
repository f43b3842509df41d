//! # Prefix Sum Benchmark
//!
//! The scan is the only pass whose cost scales with `G` rather than `N`.
//!
//! Run with: `cargo bench --package lattice_core --bench prefix_sum_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lattice_core::grid::{exclusive_scan, scan_block_count, CountSummary};
use lattice_core::ExecutionBackend;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Benchmark: exclusive scan across grid sizes.
fn bench_exclusive_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("exclusive_scan");
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for cells in [256usize, 4096, 65_536, 1_048_576] {
        let counts: Vec<u32> = (0..cells).map(|_| rng.gen_range(0..16)).collect();
        let mut offsets = vec![0u32; cells + 1];
        let mut blocks = vec![CountSummary::default(); scan_block_count(cells)];

        group.throughput(Throughput::Elements(cells as u64));
        for (name, backend) in [
            ("serial", ExecutionBackend::serial()),
            ("parallel", ExecutionBackend::parallel()),
        ] {
            group.bench_with_input(BenchmarkId::new(name, cells), &cells, |b, _| {
                b.iter(|| {
                    black_box(exclusive_scan(
                        &backend,
                        &counts,
                        &mut offsets,
                        &mut blocks,
                    ))
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_exclusive_scan);
criterion_main!(benches);

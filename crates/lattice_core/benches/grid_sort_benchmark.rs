//! # Grid Sort Benchmark
//!
//! REQUIREMENTS:
//! - 32K particles sorted well inside a 60 FPS frame
//! - 0 allocations per sort
//!
//! Run with: `cargo bench --package lattice_core --bench grid_sort_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lattice_core::{ExecutionBackend, GridOptimizer};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Particle counts matching the sample presets (1K ... 32K).
const COUNTS: [usize; 6] = [1024, 2048, 4096, 8192, 16_384, 32_768];

const RANGE: [f32; 2] = [128.0, 128.0];
const GRID_DIM: [u32; 2] = [16, 16];

fn random_positions(count: usize) -> Vec<[f32; 2]> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..count)
        .map(|_| [rng.gen_range(1.0..RANGE[0]), rng.gen_range(1.0..RANGE[1])])
        .collect()
}

/// Benchmark: one full sort (count + scan + scatter) per iteration.
fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_sort");

    for (name, backend) in [
        ("serial", ExecutionBackend::serial()),
        ("parallel", ExecutionBackend::parallel()),
    ] {
        for count in COUNTS {
            let mut positions = random_positions(count);
            let mut grid =
                GridOptimizer::with_backend(count, RANGE, GRID_DIM, backend.clone()).unwrap();

            group.throughput(Throughput::Elements(count as u64));
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, _| {
                b.iter(|| black_box(grid.sort(&mut positions).unwrap()));
            });
        }
    }

    group.finish();
}

/// Benchmark: neighbor sweep over a sorted 8K frame.
fn bench_neighbor_sweep(c: &mut Criterion) {
    let mut positions = random_positions(8192);
    let mut grid = GridOptimizer::new(8192, RANGE, GRID_DIM).unwrap();
    grid.sort(&mut positions).unwrap();

    c.bench_function("neighbor_sweep_8K", |b| {
        b.iter(|| {
            let view = grid.view(&positions);
            let mut visited = 0usize;
            for p in &positions {
                view.for_each_neighbor(*p, |_, _| visited += 1);
            }
            black_box(visited)
        });
    });
}

/// Benchmark: finer grids mean more cells to scan, fewer candidates per query.
fn bench_grid_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_resolution_8K");

    for dim in [8u32, 16, 64, 256] {
        let mut positions = random_positions(8192);
        let mut grid = GridOptimizer::new(8192, RANGE, [dim, dim]).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(dim), &dim, |b, _| {
            b.iter(|| black_box(grid.sort(&mut positions).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sort, bench_neighbor_sweep, bench_grid_resolution);
criterion_main!(benches);

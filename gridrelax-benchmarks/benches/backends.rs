use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use gridrelax::prelude::*;

fn run_relaxation(backend: BackendChoice, dimension: usize, n_workers: usize) {
    let grid: Grid<f64> = Grid::random(dimension, 1000).unwrap();
    let settings = RelaxSettings::new(n_workers, 1e-3)
        .unwrap()
        .with_backend(backend);
    let outcome = relax(grid, &settings).unwrap();
    assert!(outcome.converged);
}

fn backend_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("backend_comparison");
    group.sample_size(20);

    for (name, backend) in [
        ("lockcell", BackendChoice::LockCell),
        ("jacobi", BackendChoice::Jacobi),
        ("banded", BackendChoice::Banded),
    ] {
        group.bench_function(name, |b| b.iter(|| run_relaxation(backend, 128, 4)));
    }
    group.bench_function("reference", |b| {
        b.iter(|| {
            let grid: Grid<f64> = Grid::random(128, 1000).unwrap();
            relax_reference(grid, 1e-3, None).unwrap()
        })
    });
    group.finish();
}

fn worker_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_scaling");
    group.sample_size(10);

    for n_workers in 1..9 {
        group.bench_with_input(
            BenchmarkId::new("banded", n_workers),
            &n_workers,
            |b, &n_workers| b.iter(|| run_relaxation(BackendChoice::Banded, 256, n_workers)),
        );
    }
    group.finish();
}

fn grid_size_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_size_scaling");
    group.sample_size(10);

    for dimension in [32, 64, 128, 256] {
        group.bench_with_input(
            BenchmarkId::new("jacobi", dimension),
            &dimension,
            |b, &dimension| b.iter(|| run_relaxation(BackendChoice::Jacobi, dimension, 4)),
        );
    }
    group.finish();
}

criterion_group!(benches, backend_comparison, worker_scaling, grid_size_scaling);
criterion_main!(benches);

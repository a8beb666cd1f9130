//! Benchmarks for the Gustavson/Hash crossover and the saxpy/dot2 selection
//! threshold, giving a regression signal for the partitioner's tuning
//! constants.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use graphblas_core::descriptor::EngineConfig;
use graphblas_core::mask::Mask;
use graphblas_core::matrix::{Matrix, Orientation};
use graphblas_core::semiring::plus_times;
use graphblas_engine::dot::dot2;
use graphblas_engine::saxpy::saxpy_multiply;

fn banded_matrix(n: usize, bandwidth: usize) -> Matrix<f64> {
    let mut triples = Vec::new();
    for i in 0..n {
        let lo = i.saturating_sub(bandwidth);
        let hi = (i + bandwidth + 1).min(n);
        for j in lo..hi {
            triples.push((i, j, 1.0));
        }
    }
    Matrix::from_triples(n, n, Orientation::ColMajor, false, triples, |a, _| a)
}

fn dense_column_matrix(n: usize) -> Matrix<f64> {
    let triples: Vec<_> = (0..n).map(|i| (i, 0usize, 1.0)).collect();
    Matrix::from_triples(n, 1, Orientation::ColMajor, false, triples, |a, _| a)
}

fn bench_gustavson_hash_crossover(c: &mut Criterion) {
    let mut group = c.benchmark_group("gustavson_hash_crossover");
    let sr = plus_times::<f64>();
    let mask: Mask<bool> = Mask::none();
    let cfg = EngineConfig::default();

    for &bandwidth in &[4usize, 64, 1024] {
        let n = 4096;
        let a = banded_matrix(n, bandwidth);
        let b = dense_column_matrix(n);
        group.bench_with_input(BenchmarkId::from_parameter(bandwidth), &bandwidth, |bch, _| {
            bch.iter(|| black_box(saxpy_multiply(&a, &b, &sr, &mask, false, &cfg).unwrap()));
        });
    }
    group.finish();
}

fn bench_saxpy_vs_dot2(c: &mut Criterion) {
    let mut group = c.benchmark_group("saxpy_vs_dot2");
    let sr = plus_times::<f64>();
    let mask: Mask<bool> = Mask::none();
    let cfg = EngineConfig::default();

    for &n in &[64usize, 256, 1024] {
        let a = banded_matrix(n, 2);
        let b = banded_matrix(n, 2);
        let a_t = a.transpose();

        group.bench_with_input(BenchmarkId::new("saxpy", n), &n, |bch, _| {
            bch.iter(|| black_box(saxpy_multiply(&a, &b, &sr, &mask, false, &cfg).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("dot2", n), &n, |bch, _| {
            bch.iter(|| black_box(dot2(&a_t, &b, &sr, &mask, false)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_gustavson_hash_crossover, bench_saxpy_vs_dot2);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion};
use flux_math::basis::{Basis, SpectralIndexing, Symmetry};
use flux_math::grid::{ConcentricGridOptions, Grid};
use flux_math::transform::Transform;
use ndarray::Array1;
use std::hint::black_box;

fn bench_build_matrices(c: &mut Criterion) {
    let mut opts = ConcentricGridOptions::new(12, 12, 3);
    opts.nfp = 3;
    let grid = Grid::concentric(opts).unwrap();
    let basis = Basis::fourier_zernike(8, 8, 3, 3, Symmetry::Cos, SpectralIndexing::Fringe);

    let mut group = c.benchmark_group("transform_build_L8_N3");
    group.sample_size(10);
    group.bench_function("order_1", |b| {
        b.iter(|| black_box(Transform::with_order(&grid, &basis, 1).unwrap()))
    });
    group.bench_function("order_3", |b| {
        b.iter(|| black_box(Transform::with_order(&grid, &basis, 3).unwrap()))
    });
    group.finish();
}

fn bench_apply_and_fit(c: &mut Criterion) {
    let grid = Grid::concentric(ConcentricGridOptions::new(12, 12, 3)).unwrap();
    let basis = Basis::fourier_zernike(8, 8, 3, 1, Symmetry::None, SpectralIndexing::Fringe);
    let tf = Transform::with_order(&grid, &basis, 1).unwrap();
    let coeffs = Array1::from_iter((0..basis.num_modes()).map(|k| 1.0 / (1.0 + k as f64)));
    let values = tf.transform(&coeffs, [0, 0, 0]).unwrap();

    c.bench_function("transform_apply_drho", |b| {
        b.iter(|| black_box(tf.transform(&coeffs, [1, 0, 0]).unwrap()))
    });
    c.bench_function("transform_fit", |b| {
        b.iter(|| black_box(tf.fit(&values).unwrap()))
    });
}

criterion_group!(benches, bench_build_matrices, bench_apply_and_fit);
criterion_main!(benches);

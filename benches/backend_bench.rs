use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use heal::prelude::*;

fn bfv_ops(c: &mut Criterion) {
    let backend = BfvBackend::create_with_rng(presets::bfv_4096(), ChaCha20Rng::seed_from_u64(0)).unwrap();
    let values: Vec<u64> = (0..backend.vector_size() as u64).map(|i| i % 1000).collect();
    let x = Vector::from_values(&backend, &values).unwrap();
    let ct = x.encrypt().unwrap();

    c.bench_function("bfv_encrypt", |b| b.iter(|| black_box(&x).encrypt()));
    c.bench_function("bfv_decrypt", |b| b.iter(|| black_box(&ct).decrypt()));
    c.bench_function("bfv_multiply_raw", |b| b.iter(|| black_box(&ct).multiply_raw(&ct)));
    c.bench_function("bfv_multiply_maintained", |b| b.iter(|| black_box(&ct).try_mul(&ct)));
    c.bench_function("bfv_rotate", |b| b.iter(|| black_box(&ct).try_rotate(1)));
    c.bench_function("bfv_inner_sum", |b| b.iter(|| black_box(&ct).inner_sum()));
}

fn ckks_ops(c: &mut Criterion) {
    let backend = CkksBackend::create_with_rng(presets::ckks_8192(), ChaCha20Rng::seed_from_u64(1)).unwrap();
    let values: Vec<Complex64> = (0..backend.vector_size()).map(|i| Complex64::new(i as f64 * 1e-3, 0.0)).collect();
    let x = Vector::from_values(&backend, &values).unwrap();
    let ct = x.encrypt().unwrap();

    c.bench_function("ckks_encrypt", |b| b.iter(|| black_box(&x).encrypt()));
    c.bench_function("ckks_multiply_raw", |b| b.iter(|| black_box(&ct).multiply_raw(&ct)));
    c.bench_function("ckks_multiply_maintained", |b| b.iter(|| black_box(&ct).try_mul(&ct)));
    c.bench_function("ckks_inner_sum", |b| b.iter(|| black_box(&ct).inner_sum()));
}

fn statistics(c: &mut Criterion) {
    let backend = BfvBackend::create_with_rng(presets::bfv_8192(), ChaCha20Rng::seed_from_u64(2)).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let x = stats::random_vector(&backend, &mut rng, |r| rand::Rng::random_range(r, 0..100u64));
    let mask = stats::random_mask(&backend, &mut rng, 0.5).unwrap();
    let (ex, em) = (x.encrypt().unwrap(), mask.encrypt().unwrap());

    let mut group = c.benchmark_group("stats");
    group.sample_size(10);
    group.bench_function("average_encrypted", |b| b.iter(|| stats::average(black_box(&ex), &em)));
    group.bench_function("variance_encrypted", |b| b.iter(|| stats::variance(black_box(&ex), &em)));
    group.finish();
}

criterion_group!(benches, bfv_ops, ckks_ops, statistics);
criterion_main!(benches);

mod common;

use common::{assert_close, bfv_4096, bfv_8192, ckks_8192, init_tracing, real};
use heal::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

#[test]
fn encrypted_average_over_mask() {
    let b = bfv_4096();
    let x = Vector::padded(b, &[10, 20, 30, 40]).unwrap();
    let mask = Vector::padded(b, &[1, 0, 1, 1]).unwrap();

    let avg = stats::average(&x.encrypt().unwrap(), &mask.encrypt().unwrap()).unwrap();
    assert_eq!(avg, 26);
    assert_eq!(stats::average(&x, &mask).unwrap(), 26);
}

#[test]
fn encrypted_variance_and_covariance() {
    let b = bfv_8192();
    let x = Vector::padded(b, &[10, 20, 30, 40]).unwrap();
    let y = Vector::padded(b, &[1, 2, 3, 4]).unwrap();
    let mask = Vector::padded(b, &[1, 0, 1, 1]).unwrap();
    let (ex, ey, em) = (x.encrypt().unwrap(), y.encrypt().unwrap(), mask.encrypt().unwrap());

    assert_eq!(stats::variance(&ex, &em).unwrap(), 155);
    assert_eq!(stats::covariance(&ex, &ey, &em).unwrap(), 15);
    assert_eq!(stats::variance(&x, &mask).unwrap(), 155);
    assert_eq!(stats::covariance(&x, &y, &mask).unwrap(), 15);
}

#[test]
fn encrypted_moments_do_not_wrap_in_the_clear() {
    let b = bfv_8192();
    let mask = Vector::padded(b, &[1; 4]).unwrap().encrypt().unwrap();
    let x = Vector::padded(b, &[50, 60, 70, 80]).unwrap().encrypt().unwrap();
    let y = Vector::padded(b, &[80, 70, 60, 50]).unwrap().encrypt().unwrap();

    assert_eq!(stats::variance(&x, &mask).unwrap(), 125);
    assert_eq!(stats::covariance(&x, &x, &mask).unwrap(), 125);
    assert_eq!(stats::covariance(&x, &y, &mask).unwrap(), 65537 - 125);
}

#[test]
fn empty_mask_is_reported() {
    let b = bfv_4096();
    let x = Vector::padded(b, &[10, 20]).unwrap().encrypt().unwrap();
    let mask = b.make_vector(0).encrypt().unwrap();
    assert!(matches!(stats::average(&x, &mask), Err(HealError::EmptySelection)));
}

#[test]
fn approximate_statistics_match_plaintext() {
    let b = ckks_8192();
    let mut rng = ChaCha20Rng::seed_from_u64(17);
    let x = stats::random_vector(b, &mut rng, |r| Complex64::new(r.random_range(0.0..8.0), 0.0));
    let y = stats::random_vector(b, &mut rng, |r| Complex64::new(r.random_range(0.0..8.0), 0.0));
    let mask = stats::random_mask(b, &mut rng, 0.1).unwrap();
    let (ex, ey, em) = (x.encrypt().unwrap(), y.encrypt().unwrap(), mask.encrypt().unwrap());

    let pairs = [
        (stats::average(&x, &mask).unwrap(), stats::average(&ex, &em).unwrap()),
        (stats::variance(&x, &mask).unwrap(), stats::variance(&ex, &em).unwrap()),
        (stats::covariance(&x, &y, &mask).unwrap(), stats::covariance(&ex, &ey, &em).unwrap()),
    ];
    for (plain, encrypted) in pairs {
        assert!((plain - encrypted).norm() < 1e-2 * plain.norm().max(1.0), "{plain} vs {encrypted}");
    }
}

#[test]
fn rotate_there_and_back() {
    let b = bfv_4096();
    let ramp: Vec<u64> = (1..=b.vector_size() as u64).collect();
    let x = Vector::from_values(b, &ramp).unwrap();
    let ct = x.encrypt().unwrap();
    for k in [1i64, 5, 700, -3] {
        let back = &(&ct << k) >> k;
        assert_eq!(back.decrypt().unwrap(), x);
        assert_eq!(&(&x << k) >> k, x);
    }
    assert_eq!((&ct << 5).decrypt().unwrap(), &x << 5);
    assert_eq!((!&ct).decrypt().unwrap(), !&x);
}

#[test]
fn inner_sum_matches_arithmetic_sum() {
    let b = bfv_4096();
    let values: Vec<u64> = (0..b.vector_size() as u64).map(|i| i % 13).collect();
    let expected = values.iter().sum::<u64>() % 65537;
    let x = Vector::from_values(b, &values).unwrap();
    assert_eq!(x.inner_sum().unwrap().extract_at(0).unwrap(), expected);
    assert_eq!(x.encrypt().unwrap().inner_sum().unwrap().extract_at(0).unwrap(), expected);

    let c = ckks_8192();
    let v = real(&(0..c.vector_size()).map(|i| (i % 7) as f64 * 0.01).collect::<Vec<_>>());
    let total: Complex64 = v.iter().sum();
    let summed = Vector::from_values(c, &v).unwrap().encrypt().unwrap().inner_sum().unwrap();
    // every slot holds the total
    let decrypted = summed.decrypt().unwrap();
    assert_close(&decrypted.values()[..4], &[total; 4], 1e-2);
    assert_close(&decrypted.values()[c.vector_size() - 1..], &[total], 1e-2);
}

#[test]
fn raw_product_must_be_maintained_before_next_multiply() {
    let b = bfv_8192();
    let x = Vector::padded(b, &[2, 3, 4]).unwrap().encrypt().unwrap();

    let raw = x.multiply_raw(&x).unwrap();
    assert_eq!(raw.degree(), 2);
    assert!(matches!(raw.try_mul(&x), Err(HealError::NotLinear { degree: 2 })));

    let full = &x * &x;
    assert_eq!(full.degree(), 1);
    let cube = full.try_mul(&x).unwrap();
    assert_eq!(&cube.decrypt().unwrap().values()[..4], &[8, 27, 64, 0]);

    let mut relinearized = raw.clone();
    relinearized.relinearize().unwrap();
    assert_eq!(relinearized.try_mul(&x).unwrap().decrypt().unwrap(), cube.decrypt().unwrap());
}

#[test]
fn approximate_product_chain() {
    let b = ckks_8192();
    let x = Vector::padded(b, &real(&[1.5, -2.0, 0.25])).unwrap().encrypt().unwrap();
    let top = x.level();
    let square = &x * &x;
    assert_eq!(square.level(), top - 1);
    assert!((square.scale() / b.default_scale() - 1.0).abs() < 1e-3);

    // operands at different levels need an explicit alignment step
    assert!(matches!(square.try_mul(&x), Err(HealError::LevelMismatch { .. })));
    let mut aligned = x.clone();
    aligned.modulus_switch().unwrap();
    aligned.assume_scale(square.scale()).unwrap();
    let cube = square.try_mul(&aligned).unwrap();
    assert_eq!(cube.level(), top - 2);
    assert_close(&cube.decrypt().unwrap().values()[..3], &real(&[3.375, -8.0, 0.015625]), 1e-2);
}

#[test]
fn switching_past_the_last_level_fails() {
    let b = bfv_4096();
    let mut ct = Vector::padded(b, &[7]).unwrap().encrypt().unwrap();
    while ct.level() > 0 {
        ct.modulus_switch().unwrap();
    }
    assert_eq!(ct.extract_at(0).unwrap(), 7);
    assert!(matches!(ct.modulus_switch(), Err(HealError::ModulusChainExhausted)));

    let c = ckks_8192();
    let mut ct = Vector::padded(c, &real(&[0.5])).unwrap().encrypt().unwrap();
    let scale = ct.scale();
    assert!(matches!(ct.modulus_rescale(), Ok(_)));
    assert!(ct.scale() < scale);
    ct.modulus_rescale().unwrap();
    assert_eq!(ct.level(), 0);
    assert!(matches!(ct.modulus_rescale(), Err(HealError::ModulusChainExhausted)));
    assert!(matches!(ct.modulus_switch(), Err(HealError::ModulusChainExhausted)));
}

#[test]
fn values_from_different_backends_do_not_mix() {
    let a = bfv_4096();
    let other = BfvBackend::create_with_rng(presets::bfv_4096(), ChaCha20Rng::seed_from_u64(99)).unwrap();
    let x = Vector::padded(a, &[1, 2]).unwrap();
    let y = Vector::padded(&other, &[1, 2]).unwrap();
    assert!(matches!(x.try_add(&y), Err(HealError::BackendMismatch)));

    let ex = x.encrypt().unwrap();
    let ey = y.encrypt().unwrap();
    assert!(matches!(ex.try_add(&ey), Err(HealError::BackendMismatch)));
    assert!(matches!(ex.try_mul(&ey), Err(HealError::BackendMismatch)));
    assert!(matches!(a.decrypt(&ey), Err(HealError::BackendMismatch)));
}

#[test]
fn vector_construction_and_indexing() {
    let b = bfv_4096();
    assert!(matches!(
        Vector::from_values(b, &[1, 2, 3]),
        Err(HealError::DimensionMismatch { expected: 4096, got: 3 })
    ));
    let mut v = Vector::padded(b, &[1, 2, 3]).unwrap();
    assert_eq!(v.get(-1).unwrap(), 0);
    v.set(-1, 9).unwrap();
    assert_eq!(v.extract_at(4095).unwrap(), 9);
    assert!(v.get(4096).is_err());
}

#[test]
fn options_report_parameters() {
    let b = bfv_4096();
    assert_eq!(b.options().to_string(), "BfvOptions{degree=4096,plain_modulus=65537,plain_modulus_bits=17}");
    let c = ckks_8192();
    assert_eq!(c.options().levels, 4);
    assert_eq!(c.vector_size(), 4096);
    assert_eq!(c.maintenance_policy().after_multiply, &[Maintenance::Relinearize, Maintenance::Rescale]);
}

#[test]
fn constants_shaped_like_an_existing_value() {
    let b = bfv_4096();
    let x = Vector::padded(b, &[3, 4, 5]).unwrap();
    assert!(x.make_zero().values().iter().all(|&v| v == 0));
    assert!(x.make_one().values().iter().all(|&v| v == 1));

    let encoded = x.encode().unwrap();
    assert_eq!(encoded.make_zero().unwrap().decode().unwrap(), x.make_zero());
    assert_eq!(encoded.make_one().unwrap().decode().unwrap(), x.make_one());

    let ct = x.encrypt().unwrap();
    assert_eq!(ct.make_one().unwrap().decrypt().unwrap(), x.make_one());
    assert_eq!(ct.try_add(&ct.make_zero().unwrap()).unwrap().decrypt().unwrap(), x);
}

#[test]
fn tracing_subscriber_installs_once() {
    init_tracing();
    init_tracing();
    assert!(tracing::dispatcher::has_been_set());
    let _ = bfv_4096();
}

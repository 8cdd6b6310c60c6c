#![allow(dead_code)]

use std::sync::OnceLock;

use heal::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing_subscriber::EnvFilter;

/// Log to the test writer, filtered by `RUST_LOG` (e.g. `RUST_LOG=heal=debug`).
/// Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn bfv_4096() -> &'static BfvBackend {
    static BACKEND: OnceLock<BfvBackend> = OnceLock::new();
    BACKEND.get_or_init(|| {
        init_tracing();
        BfvBackend::create_with_rng(presets::bfv_4096(), ChaCha20Rng::seed_from_u64(1)).unwrap()
    })
}

pub fn bfv_8192() -> &'static BfvBackend {
    static BACKEND: OnceLock<BfvBackend> = OnceLock::new();
    BACKEND.get_or_init(|| {
        init_tracing();
        BfvBackend::create_with_rng(presets::bfv_8192(), ChaCha20Rng::seed_from_u64(2)).unwrap()
    })
}

pub fn ckks_8192() -> &'static CkksBackend {
    static BACKEND: OnceLock<CkksBackend> = OnceLock::new();
    BACKEND.get_or_init(|| {
        init_tracing();
        CkksBackend::create_with_rng(presets::ckks_8192(), ChaCha20Rng::seed_from_u64(3)).unwrap()
    })
}

pub fn real(values: &[f64]) -> Vec<Complex64> {
    values.iter().map(|&v| Complex64::new(v, 0.0)).collect()
}

pub fn assert_close(got: &[Complex64], expected: &[Complex64], tol: f64) {
    assert_eq!(got.len(), expected.len());
    for (i, (g, e)) in got.iter().zip(expected).enumerate() {
        assert!((g - e).norm() < tol, "slot {i}: got {g}, expected {e}");
    }
}

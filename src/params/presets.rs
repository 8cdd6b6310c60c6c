use crate::params::{BfvOptions, CkksOptions, Security};

/// Exact scheme at degree 4096: depth-1 circuits, 2048-slot rows.
/// `stats::variance` and `stats::covariance` exceed that depth; use [`bfv_8192`].
///
/// p = 65537, chain 36 + 36 bits with a 37-bit special prime.
pub fn bfv_4096() -> BfvOptions {
    BfvOptions::new(4096).plain_modulus(65537)
}

/// Exact scheme at degree 8192: enough noise room for two sequential
/// multiplications, which `variance` and `covariance` need.
///
/// p = 65537, chain 43 + 43 + 44 + 44 bits with a 44-bit special prime.
pub fn bfv_8192() -> BfvOptions {
    BfvOptions::new(8192).plain_modulus(65537)
}

/// Approximate scheme at degree 4096 with one rescale.
///
/// scale 2^30, chain 39 + 30 bits with a 39-bit special prime.
pub fn ckks_4096() -> CkksOptions {
    CkksOptions::new(4096).levels(3).default_scale(2f64.powi(30))
}

/// Approximate scheme at degree 8192 with two rescales.
///
/// scale 2^40, chain 60 + 40 + 40 bits with a 60-bit special prime.
pub fn ckks_8192() -> CkksOptions {
    CkksOptions::new(8192).levels(4).default_scale(2f64.powi(40))
}

/// Post-quantum variant of [`ckks_8192`]; the smaller budget costs precision, not depth.
pub fn ckks_8192_quantum() -> CkksOptions {
    ckks_8192().security(Security::Quantum128)
}

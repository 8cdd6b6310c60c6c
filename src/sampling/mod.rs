//! Noise, secret and mask sampling. Every sampler takes the caller's RNG.

pub mod gaussian;
pub mod uniform;

pub use gaussian::{sample_gaussian, NOISE_SIGMA};
pub use uniform::{sample_ternary, sample_uniform, sample_uniform_rns};

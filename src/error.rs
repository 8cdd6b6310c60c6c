use thiserror::Error;

use crate::params::Security;

#[derive(Debug, Error)]
pub enum HealError {
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("ring degree must be a supported power of 2, got {0}")]
    InvalidRingDegree(usize),

    #[error("plain modulus {modulus} does not support batching at degree {degree} (need a prime ≡ 1 mod 2·degree)")]
    PlainModulusNotBatching { modulus: u64, degree: usize },

    #[error("{requested_bits}-bit coefficient modulus exceeds the {max_bits}-bit budget of {security} at degree {degree}")]
    SecurityUnsatisfiable {
        degree: usize,
        security: Security,
        requested_bits: u32,
        max_bits: u32,
    },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("modulus mismatch")]
    ModulusMismatch,

    #[error("values belong to different backend instances")]
    BackendMismatch,

    #[error("scale mismatch: {lhs} vs {rhs}")]
    ScaleMismatch { lhs: f64, rhs: f64 },

    #[error("level mismatch: {lhs} vs {rhs}")]
    LevelMismatch { lhs: usize, rhs: usize },

    #[error("ciphertext has degree {degree}; relinearize first")]
    NotLinear { degree: usize },

    #[error("modulus chain exhausted: no level left to switch to")]
    ModulusChainExhausted,

    #[error("scale 2^{scale_bits:.1} does not fit in the {modulus_bits}-bit modulus at this level")]
    ScaleOutOfBounds { scale_bits: f64, modulus_bits: u32 },

    #[error("key switching needs at least two primes in the modulus chain")]
    KeySwitchUnavailable,

    #[error("no rotation key for Galois element {0}")]
    MissingRotationKey(usize),

    #[error("value {value} out of range for plain modulus {modulus}")]
    ValueOutOfRange { value: u64, modulus: u64 },

    #[error("index {index} out of range for {len} slots")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("mask selects no slot")]
    EmptySelection,

    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, HealError>;

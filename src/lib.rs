//! # heal: one set of algorithms over exact and approximate HE
//!
//! A [`backend::Backend`] binds a homomorphic scheme to one set of keys. The
//! value family [`Vector`](backend::Vector) (plaintext slots),
//! [`Encoded`](backend::Encoded) (packed, unencrypted) and
//! [`Encrypted`](backend::Encrypted) is generic over it, so arithmetic,
//! rotation, `inner_sum` and the [`stats`] routines run unchanged against
//! either scheme and against plaintext or ciphertext inputs.
//!
//! Two backends are provided:
//!
//! - [`BfvBackend`](bfv::BfvBackend): exact arithmetic modulo a batching prime p,
//!   two rows of n/2 slots.
//! - [`CkksBackend`](ckks::CkksBackend): approximate complex arithmetic over n/2
//!   slots with explicit scale and level.
//!
//! `*` on ciphertexts is the maintained product: it applies the backend's
//! [`MaintenancePolicy`](backend::MaintenancePolicy) (relinearize, then rescale
//! for CKKS) so the result can be multiplied again.
//! [`Encrypted::multiply_raw`](backend::Encrypted::multiply_raw) skips it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use heal::prelude::*;
//!
//! let backend = BfvBackend::create(presets::bfv_4096()).unwrap();
//! let x = Vector::padded(&backend, &[10, 20, 30, 40]).unwrap();
//! let mask = Vector::padded(&backend, &[1, 0, 1, 1]).unwrap();
//!
//! let avg = stats::average(&x.encrypt().unwrap(), &mask.encrypt().unwrap()).unwrap();
//! assert_eq!(avg, 26);
//! ```

pub mod backend;
pub mod bfv;
pub mod capi;
pub mod ckks;
pub mod error;
pub mod params;
pub mod ring;
pub mod rlwe;
pub mod sampling;
pub mod stats;

/// Convenient re-exports for common types and functions.
pub mod prelude {
    pub use crate::backend::{Backend, Encoded, Encrypted, Maintenance, MaintenancePolicy, Vector};
    pub use crate::bfv::BfvBackend;
    pub use crate::ckks::CkksBackend;
    pub use crate::error::{HealError, Result};
    pub use crate::params::{presets, BfvOptions, CkksOptions, Security};
    pub use crate::stats::{self, Aggregate};
    pub use num_complex::Complex64;
}

//! RLWE machinery shared by the exact and approximate backends: parameter
//! context, key material, encryption under the public key and key switching.

pub mod ciphertext;
pub mod context;
pub mod keys;
pub mod keyswitch;

pub use ciphertext::Ciphertext;
pub use context::RlweContext;
pub use keys::{GaloisKeys, KeySwitchKey, PublicKey, SecretKey};
pub use keyswitch::{apply_galois, reflect, relinearize, rotate};

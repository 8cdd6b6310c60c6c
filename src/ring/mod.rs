//! Polynomial arithmetic over Z_q[X]/(X^n + 1) and its RNS extension.

pub mod modular;
pub mod ntt;
pub mod poly;
pub mod rns;
pub mod slot_ntt;

pub use modular::Modulus;
pub use ntt::NttPoly;
pub use poly::CoeffPoly;
pub use rns::{CrtTable, RnsPoly, RnsPrime};
pub use slot_ntt::SlotNtt;

use tracing::trace;

use crate::error::{HealError, Result};
use crate::rlwe::Ciphertext;

/// Drop the last prime of the ciphertext modulus: c ↦ ⌊c / q_l⌉ mod Q_{l−1}.
///
/// Δ shrinks by the same factor, so the plaintext is unchanged while the
/// absolute noise drops by roughly q_l.
pub fn mod_switch_drop_prime(ct: &mut Ciphertext) -> Result<()> {
    if ct.level() == 0 {
        return Err(HealError::ModulusChainExhausted);
    }
    trace!(level = ct.level(), "modulus switch");
    *ct = ct.map_parts(|part| part.divide_round_last())?;
    Ok(())
}

use tracing::trace;

use crate::error::{HealError, Result};
use crate::rlwe::ciphertext::Ciphertext;
use crate::rlwe::context::RlweContext;
use crate::rlwe::keys::{galois_element, reflection_element, rotation_steps, GaloisKeys, KeySwitchKey};

/// Bring a degree-2 ciphertext back to degree 1. Degree-1 input is returned unchanged.
pub fn relinearize(ctx: &RlweContext, ct: &Ciphertext, rlk: &KeySwitchKey) -> Result<Ciphertext> {
    match ct.degree() {
        1 => Ok(ct.clone()),
        2 => {
            trace!(level = ct.level(), "relinearize");
            let (d0, d1) = rlk.switch(ctx, &ct.parts[2])?;
            let c0 = ct.parts[0].add(&d0)?;
            let c1 = ct.parts[1].add(&d1)?;
            Ok(Ciphertext::new(vec![c0, c1]))
        }
        degree => Err(HealError::NotLinear { degree }),
    }
}

/// Apply σ_element to the plaintext under a degree-1 ciphertext.
///
/// (σc_0, σc_1) decrypts under σ(s); switching σc_1 back to s gives
/// (σc_0 + d_0, d_1).
pub fn apply_galois(ctx: &RlweContext, ct: &Ciphertext, element: usize, key: &KeySwitchKey) -> Result<Ciphertext> {
    if ct.degree() != 1 {
        return Err(HealError::NotLinear { degree: ct.degree() });
    }
    let c0 = ct.parts[0].automorphism(element)?;
    let c1 = ct.parts[1].automorphism(element)?;
    let (d0, d1) = key.switch(ctx, &c1)?;
    Ok(Ciphertext::new(vec![c0.add(&d0)?, d1]))
}

/// Rotate slots left by `k` (right when negative), one key switch per set
/// bit of k mod n/2.
pub fn rotate(ctx: &RlweContext, keys: &GaloisKeys, ct: &Ciphertext, k: i64) -> Result<Ciphertext> {
    if ct.degree() != 1 {
        return Err(HealError::NotLinear { degree: ct.degree() });
    }
    let mut out = ct.clone();
    for step in rotation_steps(k, ctx.degree / 2) {
        let element = galois_element(step, ctx.degree);
        out = apply_galois(ctx, &out, element, keys.get(element)?)?;
    }
    Ok(out)
}

/// σ_{2n−1}: swaps the rows of a batched plaintext, conjugates a CKKS one.
pub fn reflect(ctx: &RlweContext, keys: &GaloisKeys, ct: &Ciphertext) -> Result<Ciphertext> {
    let element = reflection_element(ctx.degree);
    apply_galois(ctx, ct, element, keys.get(element)?)
}

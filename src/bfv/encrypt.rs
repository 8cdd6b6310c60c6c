use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rand::Rng;
use tracing::instrument;

use crate::bfv::context::BfvContext;
use crate::bfv::encoding::BfvPlaintext;
use crate::error::{HealError, Result};
use crate::ring::rns::RnsPoly;
use crate::rlwe::{Ciphertext, PublicKey, SecretKey};

/// Δ_l·m in R_{Q_l}.
pub fn scale_plaintext(ctx: &BfvContext, plaintext: &BfvPlaintext, level: usize) -> Result<RnsPoly> {
    let mut poly = RnsPoly::from_signed(&plaintext.centered(ctx.plain), ctx.rlwe.primes_at(level))?;
    poly.mul_residues_assign(ctx.delta_at(level)?)?;
    Ok(poly)
}

/// ct = (pk0·u + e1 + Δ·m, pk1·u + e2) at the top of the chain.
#[instrument(skip_all)]
pub fn encrypt<R: Rng + ?Sized>(
    ctx: &BfvContext,
    pk: &PublicKey,
    plaintext: &BfvPlaintext,
    rng: &mut R,
) -> Result<Ciphertext> {
    let message = scale_plaintext(ctx, plaintext, ctx.max_level())?;
    pk.encrypt(&ctx.rlwe, &message, rng)
}

/// m = ⌊p·phase / Q_l⌉ mod p, where phase = c0 + c1·s (+ c2·s²).
#[instrument(skip_all)]
pub fn decrypt(ctx: &BfvContext, sk: &SecretKey, ct: &Ciphertext) -> Result<BfvPlaintext> {
    let phase = sk.phase(ct)?;
    let crt = ctx.rlwe.crt_at(ct.level());
    let p = BigUint::from(ctx.plain.value);
    let half_q = &crt.product >> 1u32;

    let coeffs = phase
        .to_biguint(crt)?
        .into_iter()
        .map(|x| {
            let rounded = (&p * x + &half_q) / &crt.product;
            (rounded % &p)
                .to_u64()
                .ok_or_else(|| HealError::InvalidParam("decrypted coefficient exceeds plain modulus".into()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(BfvPlaintext { coeffs })
}

use num_bigint::BigInt;
use num_traits::Signed;
use tracing::instrument;

use crate::bfv::context::BfvContext;
use crate::bfv::encoding::BfvPlaintext;
use crate::bfv::encrypt::scale_plaintext;
use crate::error::{HealError, Result};
use crate::ring::rns::RnsPoly;
use crate::rlwe::Ciphertext;

/// c0 += Δ_l·m.
pub fn bfv_plain_add(ctx: &BfvContext, a: &mut Ciphertext, plaintext: &BfvPlaintext) -> Result<()> {
    let scaled = scale_plaintext(ctx, plaintext, a.level())?;
    a.parts[0].add_assign(&scaled)
}

pub fn bfv_plain_sub(ctx: &BfvContext, a: &mut Ciphertext, plaintext: &BfvPlaintext) -> Result<()> {
    let scaled = scale_plaintext(ctx, plaintext, a.level())?;
    a.parts[0].sub_assign(&scaled)
}

/// Every part times the centered plaintext polynomial.
pub fn bfv_plain_mul(ctx: &BfvContext, a: &mut Ciphertext, plaintext: &BfvPlaintext) -> Result<()> {
    let m = RnsPoly::from_signed(&plaintext.centered(ctx.plain), ctx.rlwe.primes_at(a.level()))?;
    for part in a.parts.iter_mut() {
        part.mul_assign(&m)?;
    }
    Ok(())
}

/// Tensor product (c0·d0, c0·d1 + c1·d0, c1·d1) scaled by p/Q_l with rounding.
///
/// The inputs are lifted to centered integers and multiplied in an auxiliary
/// basis large enough to hold the product exactly, so the rounding is the
/// textbook ⌊p·x/Q⌉ rather than an RNS approximation.
#[instrument(skip_all, fields(level = a.level()))]
pub fn bfv_mul(ctx: &BfvContext, a: &mut Ciphertext, b: &Ciphertext) -> Result<()> {
    for ct in [&*a, b] {
        if ct.degree() != 1 {
            return Err(HealError::NotLinear { degree: ct.degree() });
        }
    }
    a.check_level(b)?;
    let level = a.level();
    let crt = ctx.rlwe.crt_at(level);

    let lift = |poly: &RnsPoly| -> Result<RnsPoly> {
        let centered = poly.to_bigint_centered(crt)?;
        RnsPoly::from_bigint(&centered, &ctx.tensor_primes)
    };
    let c0 = lift(&a.parts[0])?;
    let c1 = lift(&a.parts[1])?;
    let d0 = lift(&b.parts[0])?;
    let d1 = lift(&b.parts[1])?;

    let t0 = c0.mul(&d0)?;
    let mut t1 = c0.mul(&d1)?;
    t1.add_assign(&c1.mul(&d0)?)?;
    let t2 = c1.mul(&d1)?;

    let q_big = BigInt::from(crt.product.clone());
    let half_q = &q_big >> 1u32;
    let p_big = BigInt::from(ctx.plain.value);
    let scale_down = |t: &RnsPoly| -> Result<RnsPoly> {
        let exact = t.to_bigint_centered(&ctx.tensor_crt)?;
        let scaled: Vec<BigInt> = exact.iter().map(|x| scale_round(x, &p_big, &q_big, &half_q)).collect();
        RnsPoly::from_bigint(&scaled, ctx.rlwe.primes_at(level))
    };

    a.parts = vec![scale_down(&t0)?, scale_down(&t1)?, scale_down(&t2)?];
    Ok(())
}

/// ⌊p·x / q⌉ with ties away from zero.
fn scale_round(x: &BigInt, p: &BigInt, q: &BigInt, half_q: &BigInt) -> BigInt {
    let num = p * x;
    if num.is_negative() {
        -((-num + half_q) / q)
    } else {
        (num + half_q) / q
    }
}

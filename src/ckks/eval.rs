use tracing::{instrument, trace};

use crate::ckks::context::CkksContext;
use crate::ckks::{CkksCiphertext, CkksPlaintext};
use crate::error::{HealError, Result};

/// Relative tolerance when comparing scales.
pub const SCALE_TOLERANCE: f64 = 1e-9;

pub fn scales_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= SCALE_TOLERANCE * a.abs().max(b.abs())
}

fn check_scale(lhs: f64, rhs: f64) -> Result<()> {
    if !scales_match(lhs, rhs) {
        return Err(HealError::ScaleMismatch { lhs, rhs });
    }
    Ok(())
}

fn check_level(lhs: usize, rhs: usize) -> Result<()> {
    if lhs != rhs {
        return Err(HealError::LevelMismatch { lhs, rhs });
    }
    Ok(())
}

/// Fail unless a value at `scale` still fits below Q_level.
pub fn check_scale_bound(ctx: &CkksContext, scale: f64, level: usize) -> Result<()> {
    let modulus_bits = ctx.rlwe.modulus_bits(level) as u32;
    let scale_bits = scale.log2();
    if !scale.is_finite() || scale_bits >= modulus_bits as f64 {
        return Err(HealError::ScaleOutOfBounds { scale_bits, modulus_bits });
    }
    Ok(())
}

pub fn ckks_add(a: &mut CkksCiphertext, b: &CkksCiphertext) -> Result<()> {
    check_scale(a.scale, b.scale)?;
    a.inner.add_assign(&b.inner)
}

pub fn ckks_sub(a: &mut CkksCiphertext, b: &CkksCiphertext) -> Result<()> {
    check_scale(a.scale, b.scale)?;
    a.inner.sub_assign(&b.inner)
}

pub fn ckks_plain_add(a: &mut CkksCiphertext, b: &CkksPlaintext) -> Result<()> {
    check_level(a.inner.level(), b.level())?;
    check_scale(a.scale, b.scale)?;
    a.inner.parts[0].add_assign(&b.poly)
}

pub fn ckks_plain_sub(a: &mut CkksCiphertext, b: &CkksPlaintext) -> Result<()> {
    check_level(a.inner.level(), b.level())?;
    check_scale(a.scale, b.scale)?;
    a.inner.parts[0].sub_assign(&b.poly)
}

/// Tensor product in RNS; the scales multiply.
#[instrument(skip_all, fields(level = a.inner.level()))]
pub fn ckks_mul(ctx: &CkksContext, a: &mut CkksCiphertext, b: &CkksCiphertext) -> Result<()> {
    for ct in [&*a, b] {
        if ct.inner.degree() != 1 {
            return Err(HealError::NotLinear { degree: ct.inner.degree() });
        }
    }
    a.inner.check_level(&b.inner)?;
    let scale = a.scale * b.scale;
    check_scale_bound(ctx, scale, a.inner.level())?;

    let (c0, c1) = (&a.inner.parts[0], &a.inner.parts[1]);
    let (d0, d1) = (&b.inner.parts[0], &b.inner.parts[1]);
    let t0 = c0.mul(d0)?;
    let mut t1 = c0.mul(d1)?;
    t1.add_assign(&c1.mul(d0)?)?;
    let t2 = c1.mul(d1)?;

    a.inner.parts = vec![t0, t1, t2];
    a.scale = scale;
    Ok(())
}

pub fn ckks_plain_mul(ctx: &CkksContext, a: &mut CkksCiphertext, b: &CkksPlaintext) -> Result<()> {
    check_level(a.inner.level(), b.level())?;
    let scale = a.scale * b.scale;
    check_scale_bound(ctx, scale, a.inner.level())?;
    for part in a.inner.parts.iter_mut() {
        part.mul_assign(&b.poly)?;
    }
    a.scale = scale;
    Ok(())
}

/// Divide by the last prime q_l and drop it; the scale shrinks by q_l.
pub fn ckks_rescale(ctx: &CkksContext, a: &mut CkksCiphertext) -> Result<()> {
    let level = a.inner.level();
    if level == 0 {
        return Err(HealError::ModulusChainExhausted);
    }
    trace!(level, scale = a.scale, "rescale");
    a.inner = a.inner.map_parts(|part| part.divide_round_last())?;
    a.scale /= ctx.prime_at(level);
    Ok(())
}

/// Drop the last prime without dividing; the scale is unchanged.
pub fn ckks_mod_switch(a: &mut CkksCiphertext) -> Result<()> {
    let level = a.inner.level();
    if level == 0 {
        return Err(HealError::ModulusChainExhausted);
    }
    trace!(level, "modulus switch");
    a.inner = a.inner.map_parts(|part| Ok(part.prefix(level - 1)))?;
    Ok(())
}

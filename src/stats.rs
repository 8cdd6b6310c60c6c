//! Masked statistics written once against [`Aggregate`].
//!
//! Every routine multiplies by a 0/1 mask, reduces with `inner_sum` and reads
//! slot 0. Division happens only after extraction, in the clear: integer
//! division for the exact scheme, complex division for the approximate one.
//! The moments finish through [`Backend::clear_moment`], so the exact scheme
//! does not reduce Σx·Σx modulo p before dividing.
//!
//! `variance` and `covariance` use the one-pass shortcut formulas. They lose
//! precision to cancellation when the mean is large relative to the spread;
//! a two-pass formula would need an extra round trip through the key holder.
//!
//! `variance` and `covariance` multiply two ciphertexts in sequence. On the
//! exact scheme that needs [`presets::bfv_8192`](crate::params::presets::bfv_8192);
//! at `bfv_4096` the second product exceeds the noise budget and decrypts to
//! an unrelated value without any error.

use num_traits::{One, Zero};
use rand::Rng;

use crate::backend::{Backend, Encrypted, Vector};
use crate::error::{HealError, Result};

/// A slot vector that can be multiplied, summed and read back.
pub trait Aggregate<'b, B: Backend + 'b>: Sized {
    fn backend(&self) -> &'b B;

    /// Slotwise product; ciphertexts come back maintained.
    fn elementwise_mul(&self, other: &Self) -> Result<Self>;

    fn inner_sum(&self) -> Result<Self>;

    /// Read one slot, decrypting when necessary.
    fn extract_at(&self, index: isize) -> Result<B::Scalar>;
}

impl<'b, B: Backend> Aggregate<'b, B> for Vector<'b, B> {
    fn backend(&self) -> &'b B {
        Vector::backend(self)
    }

    fn elementwise_mul(&self, other: &Self) -> Result<Self> {
        self.try_mul(other)
    }

    fn inner_sum(&self) -> Result<Self> {
        Vector::inner_sum(self)
    }

    fn extract_at(&self, index: isize) -> Result<B::Scalar> {
        Vector::extract_at(self, index)
    }
}

impl<'b, B: Backend> Aggregate<'b, B> for Encrypted<'b, B> {
    fn backend(&self) -> &'b B {
        Encrypted::backend(self)
    }

    fn elementwise_mul(&self, other: &Self) -> Result<Self> {
        self.try_mul(other)
    }

    fn inner_sum(&self) -> Result<Self> {
        Encrypted::inner_sum(self)
    }

    fn extract_at(&self, index: isize) -> Result<B::Scalar> {
        Encrypted::extract_at(self, index)
    }
}

fn sum_at_zero<'b, B: Backend + 'b, T: Aggregate<'b, B>>(x: &T) -> Result<B::Scalar> {
    x.inner_sum()?.extract_at(0)
}

/// Number of selected slots; fails when the mask is empty.
fn selected_count<'b, B: Backend + 'b, T: Aggregate<'b, B>>(mask: &T) -> Result<B::Scalar> {
    let count = sum_at_zero(mask)?;
    if mask.backend().scalar_is_zero(count) {
        return Err(HealError::EmptySelection);
    }
    Ok(count)
}

/// Σ(x·mask) / Σmask.
pub fn average<'b, B: Backend + 'b, T: Aggregate<'b, B>>(x: &T, mask: &T) -> Result<B::Scalar> {
    let b = x.backend();
    let count = selected_count(mask)?;
    let sum = sum_at_zero(&x.elementwise_mul(mask)?)?;
    Ok(b.scalar_div(sum, count))
}

/// (Σx² − (Σx)²/n) / n over the selected slots.
pub fn variance<'b, B: Backend + 'b, T: Aggregate<'b, B>>(x: &T, mask: &T) -> Result<B::Scalar> {
    let b = x.backend();
    let n = selected_count(mask)?;
    let masked = x.elementwise_mul(mask)?;
    let sum = sum_at_zero(&masked)?;
    // mask² = mask, so masked² is x² on the selected slots.
    let sum_sq = sum_at_zero(&masked.elementwise_mul(&masked)?)?;
    Ok(b.clear_moment(n, sum, sum, sum_sq))
}

/// (Σxy − ΣxΣy/n) / n, with one mask shared by both variables.
pub fn covariance<'b, B: Backend + 'b, T: Aggregate<'b, B>>(x: &T, y: &T, mask: &T) -> Result<B::Scalar> {
    let b = x.backend();
    let n = selected_count(mask)?;
    let xm = x.elementwise_mul(mask)?;
    let ym = y.elementwise_mul(mask)?;
    let sum_x = sum_at_zero(&xm)?;
    let sum_y = sum_at_zero(&ym)?;
    let sum_xy = sum_at_zero(&xm.elementwise_mul(&ym)?)?;
    Ok(b.clear_moment(n, sum_x, sum_y, sum_xy))
}

/// Vector whose slots are drawn from `sample`.
pub fn random_vector<'b, B, R, F>(backend: &'b B, rng: &mut R, mut sample: F) -> Vector<'b, B>
where
    B: Backend,
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> B::Scalar,
{
    let values = (0..backend.vector_size()).map(|_| sample(rng)).collect();
    Vector::from_parts(backend, values)
}

/// 0/1 mask selecting each slot with probability `density`.
pub fn random_mask<'b, B, R>(backend: &'b B, rng: &mut R, density: f64) -> Result<Vector<'b, B>>
where
    B: Backend,
    R: Rng + ?Sized,
{
    if !(0.0..=1.0).contains(&density) {
        return Err(HealError::InvalidParam(format!("mask density must lie in [0, 1], got {density}")));
    }
    let values = (0..backend.vector_size())
        .map(|_| if rng.random_bool(density) { B::Scalar::one() } else { B::Scalar::zero() })
        .collect();
    Ok(Vector::from_parts(backend, values))
}

//! Scheme-independent capability contract and the value family built on it.
//!
//! A [`Backend`] supplies raw engine operations on its own plaintext and
//! ciphertext types. The provided methods lift those onto [`Vector`],
//! [`Encoded`] and [`Encrypted`], checking that every operand is bound to the
//! same backend instance, and implement the maintained multiply and the
//! log-step inner sum once for both schemes.

mod encoded;
mod encrypted;
mod ops;
mod vector;

use std::fmt;
use std::ptr;

use num_traits::{One, Zero};
use tracing::trace;

use crate::error::{HealError, Result};

pub use encoded::Encoded;
pub use encrypted::Encrypted;
pub use vector::Vector;

/// Ciphertext shape as seen by the maintenance logic.
pub trait CiphertextInfo {
    /// Number of parts minus one: 1 when linear, 2 after a raw product.
    fn degree(&self) -> usize;
    /// Position in the modulus chain; 0 means nothing is left to drop.
    fn level(&self) -> usize;
}

impl CiphertextInfo for crate::rlwe::Ciphertext {
    fn degree(&self) -> usize {
        crate::rlwe::Ciphertext::degree(self)
    }

    fn level(&self) -> usize {
        crate::rlwe::Ciphertext::level(self)
    }
}

/// One maintenance step applied after a multiplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Maintenance {
    Relinearize,
    Rescale,
}

/// Ordered maintenance a backend needs after each kind of product.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaintenancePolicy {
    pub after_multiply: &'static [Maintenance],
    pub after_multiply_plain: &'static [Maintenance],
}

/// How slots are laid out for the rotate-and-add reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SumLayout {
    /// Length of the rotation cycle.
    pub row: usize,
    /// Add the reflected value once the row is summed.
    pub fold_rows: bool,
}

/// A homomorphic encryption scheme bound to one set of keys.
///
/// Required methods work on the engine's native types; everything that takes
/// a `Vector`, `Encoded` or `Encrypted` is provided on top of them. Provided
/// binary operations return [`HealError::BackendMismatch`] when an operand was
/// created by a different backend instance.
pub trait Backend: Sized {
    type Scalar: Copy + PartialEq + fmt::Debug + Zero + One;
    type Options: Clone + fmt::Debug + fmt::Display;
    type Plaintext: Clone + fmt::Debug;
    type Ciphertext: Clone + fmt::Debug + CiphertextInfo;

    /// The options actually in effect, with derived fields filled in.
    fn options(&self) -> &Self::Options;

    /// Number of slots in a vector.
    fn vector_size(&self) -> usize;

    fn maintenance_policy(&self) -> MaintenancePolicy;

    fn sum_layout(&self) -> SumLayout;

    // Slot arithmetic in the scheme's plaintext semantics.
    fn scalar_add(&self, a: Self::Scalar, b: Self::Scalar) -> Self::Scalar;
    fn scalar_sub(&self, a: Self::Scalar, b: Self::Scalar) -> Self::Scalar;
    fn scalar_mul(&self, a: Self::Scalar, b: Self::Scalar) -> Self::Scalar;
    fn scalar_neg(&self, a: Self::Scalar) -> Self::Scalar;
    /// Division in the clear, after extraction.
    fn scalar_div(&self, a: Self::Scalar, b: Self::Scalar) -> Self::Scalar;
    /// Whether an extracted count should be treated as zero.
    fn scalar_is_zero(&self, a: Self::Scalar) -> bool;

    /// (Σab − Σa·Σb/n) / n on extracted aggregates, evaluated in the clear.
    ///
    /// The default uses the slot arithmetic above. Backends whose slot
    /// arithmetic is modular override it so the products do not wrap.
    fn clear_moment(&self, n: Self::Scalar, sum_a: Self::Scalar, sum_b: Self::Scalar, sum_ab: Self::Scalar) -> Self::Scalar {
        let correction = self.scalar_div(self.scalar_mul(sum_a, sum_b), n);
        self.scalar_div(self.scalar_sub(sum_ab, correction), n)
    }

    /// Plaintext counterpart of rotating a ciphertext left by `k`.
    fn rotate_slots(&self, values: &[Self::Scalar], k: i64) -> Vec<Self::Scalar>;
    /// Plaintext counterpart of [`Backend::eval_flip`].
    fn flip_slots(&self, values: &[Self::Scalar]) -> Vec<Self::Scalar>;

    fn encode_values(&self, values: &[Self::Scalar]) -> Result<Self::Plaintext>;
    fn decode_values(&self, plaintext: &Self::Plaintext) -> Result<Vec<Self::Scalar>>;
    fn encrypt_plaintext(&self, plaintext: &Self::Plaintext) -> Result<Self::Ciphertext>;
    fn decrypt_ciphertext(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Plaintext>;

    fn eval_add(&self, a: &mut Self::Ciphertext, b: &Self::Ciphertext) -> Result<()>;
    fn eval_add_plain(&self, a: &mut Self::Ciphertext, b: &Self::Plaintext) -> Result<()>;
    fn eval_sub(&self, a: &mut Self::Ciphertext, b: &Self::Ciphertext) -> Result<()>;
    fn eval_sub_plain(&self, a: &mut Self::Ciphertext, b: &Self::Plaintext) -> Result<()>;
    /// Product without maintenance; the result has degree 2.
    fn eval_multiply(&self, a: &mut Self::Ciphertext, b: &Self::Ciphertext) -> Result<()>;
    fn eval_multiply_plain(&self, a: &mut Self::Ciphertext, b: &Self::Plaintext) -> Result<()>;
    fn eval_negate(&self, a: &mut Self::Ciphertext) -> Result<()>;
    /// Rotate slots left by `k`; negative `k` rotates right.
    fn eval_rotate(&self, a: &mut Self::Ciphertext, k: i64) -> Result<()>;
    /// Row swap for the exact scheme, complex conjugation for the approximate one.
    fn eval_flip(&self, a: &mut Self::Ciphertext) -> Result<()>;
    fn eval_relinearize(&self, a: &mut Self::Ciphertext) -> Result<()>;
    /// Drop one prime from the chain.
    fn eval_modulus_switch(&self, a: &mut Self::Ciphertext) -> Result<()>;

    /// Drop one prime and divide the scale by it.
    fn eval_rescale(&self, _a: &mut Self::Ciphertext) -> Result<()> {
        Err(HealError::Unsupported("rescale"))
    }

    /// Vector with every slot set to `value`.
    fn make_vector(&self, value: Self::Scalar) -> Vector<'_, Self> {
        Vector::filled(self, value)
    }

    fn encode<'b>(&'b self, vector: &Vector<'b, Self>) -> Result<Encoded<'b, Self>> {
        self.check_owner(vector.backend())?;
        Ok(Encoded::from_parts(self, self.encode_values(vector.values())?))
    }

    fn decode<'b>(&'b self, encoded: &Encoded<'b, Self>) -> Result<Vector<'b, Self>> {
        self.check_owner(encoded.backend())?;
        Ok(Vector::from_parts(self, self.decode_values(encoded.plaintext())?))
    }

    fn encrypt<'b>(&'b self, encoded: &Encoded<'b, Self>) -> Result<Encrypted<'b, Self>> {
        self.check_owner(encoded.backend())?;
        Ok(Encrypted::from_parts(self, self.encrypt_plaintext(encoded.plaintext())?))
    }

    fn encrypt_vector<'b>(&'b self, vector: &Vector<'b, Self>) -> Result<Encrypted<'b, Self>> {
        let encoded = self.encode(vector)?;
        self.encrypt(&encoded)
    }

    fn decrypt<'b>(&'b self, encrypted: &Encrypted<'b, Self>) -> Result<Vector<'b, Self>> {
        let encoded = self.decrypt_encoded(encrypted)?;
        self.decode(&encoded)
    }

    fn decrypt_encoded<'b>(&'b self, encrypted: &Encrypted<'b, Self>) -> Result<Encoded<'b, Self>> {
        self.check_owner(encrypted.backend())?;
        Ok(Encoded::from_parts(self, self.decrypt_ciphertext(encrypted.ciphertext())?))
    }

    fn add<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>, b: &Encrypted<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_pair(a.backend(), b.backend())?;
        self.eval_add(a.ciphertext_mut(), b.ciphertext())?;
        Ok(a)
    }

    fn add_plain<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>, b: &Encoded<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_pair(a.backend(), b.backend())?;
        self.eval_add_plain(a.ciphertext_mut(), b.plaintext())?;
        Ok(a)
    }

    fn subtract<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>, b: &Encrypted<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_pair(a.backend(), b.backend())?;
        self.eval_sub(a.ciphertext_mut(), b.ciphertext())?;
        Ok(a)
    }

    fn subtract_plain<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>, b: &Encoded<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_pair(a.backend(), b.backend())?;
        self.eval_sub_plain(a.ciphertext_mut(), b.plaintext())?;
        Ok(a)
    }

    /// Raw product: cheap, but the result must be relinearized before the next multiply.
    fn multiply<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>, b: &Encrypted<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_pair(a.backend(), b.backend())?;
        self.eval_multiply(a.ciphertext_mut(), b.ciphertext())?;
        Ok(a)
    }

    fn multiply_plain<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>, b: &Encoded<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_pair(a.backend(), b.backend())?;
        self.eval_multiply_plain(a.ciphertext_mut(), b.plaintext())?;
        Ok(a)
    }

    fn negate<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_owner(a.backend())?;
        self.eval_negate(a.ciphertext_mut())?;
        Ok(a)
    }

    fn rotate<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>, k: i64) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_owner(a.backend())?;
        self.eval_rotate(a.ciphertext_mut(), k)?;
        Ok(a)
    }

    fn flip<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_owner(a.backend())?;
        self.eval_flip(a.ciphertext_mut())?;
        Ok(a)
    }

    fn relinearize<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_owner(a.backend())?;
        self.eval_relinearize(a.ciphertext_mut())?;
        Ok(a)
    }

    fn modulus_switch<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_owner(a.backend())?;
        self.eval_modulus_switch(a.ciphertext_mut())?;
        Ok(a)
    }

    /// Apply maintenance steps in order.
    fn maintain<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>, steps: &[Maintenance]) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_owner(a.backend())?;
        for step in steps {
            trace!(?step, degree = a.degree(), level = a.level(), "maintain");
            match step {
                Maintenance::Relinearize => self.eval_relinearize(a.ciphertext_mut())?,
                Maintenance::Rescale => self.eval_rescale(a.ciphertext_mut())?,
            }
        }
        Ok(a)
    }

    /// Multiply, then restore the invariants the next multiply relies on.
    fn multiply_and_maintain<'v, 'b>(
        &self,
        a: &'v mut Encrypted<'b, Self>,
        b: &Encrypted<'b, Self>,
    ) -> Result<&'v mut Encrypted<'b, Self>> {
        let steps = self.maintenance_policy().after_multiply;
        let a = self.multiply(a, b)?;
        self.maintain(a, steps)
    }

    fn multiply_plain_and_maintain<'v, 'b>(
        &self,
        a: &'v mut Encrypted<'b, Self>,
        b: &Encoded<'b, Self>,
    ) -> Result<&'v mut Encrypted<'b, Self>> {
        let steps = self.maintenance_policy().after_multiply_plain;
        let a = self.multiply_plain(a, b)?;
        self.maintain(a, steps)
    }

    /// Sum of all slots, left in slot 0, in O(log n) rotations.
    fn inner_sum<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_owner(a.backend())?;
        rotate_and_sum(a, self.sum_layout())?;
        Ok(a)
    }

    #[doc(hidden)]
    fn check_owner(&self, owner: &Self) -> Result<()> {
        if ptr::eq(self, owner) { Ok(()) } else { Err(HealError::BackendMismatch) }
    }

    #[doc(hidden)]
    fn check_pair(&self, a: &Self, b: &Self) -> Result<()> {
        self.check_owner(a)?;
        self.check_owner(b)
    }
}

/// The operations the rotate-and-add reduction needs, shared by plaintext
/// vectors and ciphertexts so both follow the same schedule.
pub trait SlotRotate: Sized {
    fn rotated(&self, k: i64) -> Result<Self>;
    fn flipped(&self) -> Result<Self>;
    fn accumulate(&mut self, other: &Self) -> Result<()>;
}

/// Add rotations by 1, 2, 4, ... below `layout.row`, then fold the rows once.
///
/// After the loop every slot of a row holds the row sum; the fold adds the
/// other row's sum.
pub fn rotate_and_sum<T: SlotRotate>(x: &mut T, layout: SumLayout) -> Result<()> {
    let mut step = 1usize;
    while step < layout.row {
        let shifted = x.rotated(step as i64)?;
        x.accumulate(&shifted)?;
        step <<= 1;
    }
    if layout.fold_rows {
        let flipped = x.flipped()?;
        x.accumulate(&flipped)?;
    }
    Ok(())
}

/// Resolve a possibly negative index against `len`.
pub(crate) fn resolve_index(index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 { len as isize + index } else { index };
    if resolved < 0 || resolved as usize >= len {
        return Err(HealError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts the rotations it is asked for.
    struct Tally {
        slots: Vec<u64>,
        rotations: usize,
    }

    impl SlotRotate for Tally {
        fn rotated(&self, k: i64) -> Result<Self> {
            let mut slots = self.slots.clone();
            slots.rotate_left(k as usize % self.slots.len());
            Ok(Self { slots, rotations: 0 })
        }

        fn flipped(&self) -> Result<Self> {
            Ok(Self { slots: self.slots.iter().rev().copied().collect(), rotations: 0 })
        }

        fn accumulate(&mut self, other: &Self) -> Result<()> {
            for (a, b) in self.slots.iter_mut().zip(&other.slots) {
                *a += b;
            }
            self.rotations += 1;
            Ok(())
        }
    }

    #[test]
    fn test_rotate_and_sum_is_logarithmic() {
        let mut x = Tally { slots: (1..=64).collect(), rotations: 0 };
        rotate_and_sum(&mut x, SumLayout { row: 64, fold_rows: false }).unwrap();
        assert_eq!(x.rotations, 6);
        assert!(x.slots.iter().all(|&s| s == 64 * 65 / 2));
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(0, 4).unwrap(), 0);
        assert_eq!(resolve_index(-1, 4).unwrap(), 3);
        assert!(matches!(resolve_index(4, 4), Err(HealError::IndexOutOfRange { index: 4, len: 4 })));
        assert!(matches!(resolve_index(-5, 4), Err(HealError::IndexOutOfRange { .. })));
    }
}

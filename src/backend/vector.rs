use std::fmt;

use num_traits::{One, Zero};

use crate::backend::{resolve_index, rotate_and_sum, Backend, Encoded, Encrypted, SlotRotate};
use crate::error::{HealError, Result};

/// Plaintext slot vector bound to a backend.
///
/// The length always equals [`Backend::vector_size`]. Arithmetic follows the
/// scheme's slot semantics, so the exact backend works modulo its plaintext
/// modulus.
pub struct Vector<'b, B: Backend> {
    backend: &'b B,
    values: Vec<B::Scalar>,
}

impl<'b, B: Backend> Vector<'b, B> {
    pub(crate) fn from_parts(backend: &'b B, values: Vec<B::Scalar>) -> Self {
        Self { backend, values }
    }

    pub fn filled(backend: &'b B, value: B::Scalar) -> Self {
        Self { backend, values: vec![value; backend.vector_size()] }
    }

    /// Exactly one value per slot.
    pub fn from_values(backend: &'b B, values: &[B::Scalar]) -> Result<Self> {
        let width = backend.vector_size();
        if values.len() != width {
            return Err(HealError::DimensionMismatch { expected: width, got: values.len() });
        }
        Ok(Self { backend, values: values.to_vec() })
    }

    /// `prefix` followed by zeros up to the full width.
    pub fn padded(backend: &'b B, prefix: &[B::Scalar]) -> Result<Self> {
        let width = backend.vector_size();
        if prefix.len() > width {
            return Err(HealError::DimensionMismatch { expected: width, got: prefix.len() });
        }
        let mut values = prefix.to_vec();
        values.resize(width, num_traits::Zero::zero());
        Ok(Self { backend, values })
    }

    pub fn backend(&self) -> &'b B {
        self.backend
    }

    pub fn values(&self) -> &[B::Scalar] {
        &self.values
    }

    pub fn into_values(self) -> Vec<B::Scalar> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Slot `index`; negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<B::Scalar> {
        Ok(self.values[resolve_index(index, self.values.len())?])
    }

    pub fn set(&mut self, index: isize, value: B::Scalar) -> Result<()> {
        let i = resolve_index(index, self.values.len())?;
        self.values[i] = value;
        Ok(())
    }

    /// All-zero vector on the same backend.
    pub fn make_zero(&self) -> Self {
        self.backend.make_vector(B::Scalar::zero())
    }

    /// All-one vector on the same backend.
    pub fn make_one(&self) -> Self {
        self.backend.make_vector(B::Scalar::one())
    }

    /// Same as [`Vector::get`]; named to match [`Encrypted::extract_at`].
    pub fn extract_at(&self, index: isize) -> Result<B::Scalar> {
        self.get(index)
    }

    pub fn encode(&self) -> Result<Encoded<'b, B>> {
        self.backend.encode(self)
    }

    pub fn encrypt(&self) -> Result<Encrypted<'b, B>> {
        self.backend.encrypt_vector(self)
    }

    pub fn try_add(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, |b, x, y| b.scalar_add(x, y))
    }

    pub fn try_sub(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, |b, x, y| b.scalar_sub(x, y))
    }

    pub fn try_mul(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, |b, x, y| b.scalar_mul(x, y))
    }

    pub fn negated(&self) -> Self {
        let values = self.values.iter().map(|&x| self.backend.scalar_neg(x)).collect();
        Self { backend: self.backend, values }
    }

    /// Rotate left by `k` slots, the same movement [`Encrypted::try_rotate`] performs.
    pub fn rotate(&self, k: i64) -> Self {
        Self { backend: self.backend, values: self.backend.rotate_slots(&self.values, k) }
    }

    pub fn flip(&self) -> Self {
        Self { backend: self.backend, values: self.backend.flip_slots(&self.values) }
    }

    /// Slot sum in slot 0, computed with the same rotation schedule as ciphertexts.
    pub fn inner_sum(&self) -> Result<Self> {
        let mut out = self.clone();
        rotate_and_sum(&mut out, self.backend.sum_layout())?;
        Ok(out)
    }

    fn zip_with<F>(&self, rhs: &Self, f: F) -> Result<Self>
    where
        F: Fn(&B, B::Scalar, B::Scalar) -> B::Scalar,
    {
        self.backend.check_owner(rhs.backend)?;
        let values = self.values.iter().zip(&rhs.values).map(|(&x, &y)| f(self.backend, x, y)).collect();
        Ok(Self { backend: self.backend, values })
    }
}

impl<B: Backend> SlotRotate for Vector<'_, B> {
    fn rotated(&self, k: i64) -> Result<Self> {
        Ok(self.rotate(k))
    }

    fn flipped(&self) -> Result<Self> {
        Ok(self.flip())
    }

    fn accumulate(&mut self, other: &Self) -> Result<()> {
        *self = self.try_add(other)?;
        Ok(())
    }
}

impl<B: Backend> Clone for Vector<'_, B> {
    fn clone(&self) -> Self {
        Self { backend: self.backend, values: self.values.clone() }
    }
}

impl<B: Backend> fmt::Debug for Vector<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector").field("values", &self.values).finish()
    }
}

impl<B: Backend> PartialEq for Vector<'_, B> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.backend, other.backend) && self.values == other.values
    }
}

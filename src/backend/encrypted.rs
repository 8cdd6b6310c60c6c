use std::fmt;

use num_traits::{One, Zero};

use crate::backend::{Backend, CiphertextInfo, Encoded, SlotRotate, Vector};
use crate::error::Result;

/// A ciphertext bound to the backend holding its keys.
///
/// The `try_*` methods return new values; the in-place forms live on
/// [`Backend`] and on the compound assignment operators.
pub struct Encrypted<'b, B: Backend> {
    backend: &'b B,
    ciphertext: B::Ciphertext,
}

impl<'b, B: Backend> Encrypted<'b, B> {
    pub(crate) fn from_parts(backend: &'b B, ciphertext: B::Ciphertext) -> Self {
        Self { backend, ciphertext }
    }

    pub fn backend(&self) -> &'b B {
        self.backend
    }

    pub fn ciphertext(&self) -> &B::Ciphertext {
        &self.ciphertext
    }

    pub(crate) fn ciphertext_mut(&mut self) -> &mut B::Ciphertext {
        &mut self.ciphertext
    }

    /// 1 when linear, 2 after [`Encrypted::multiply_raw`].
    pub fn degree(&self) -> usize {
        self.ciphertext.degree()
    }

    pub fn level(&self) -> usize {
        self.ciphertext.level()
    }

    pub fn decrypt(&self) -> Result<Vector<'b, B>> {
        self.backend.decrypt(self)
    }

    pub fn decrypt_encoded(&self) -> Result<Encoded<'b, B>> {
        self.backend.decrypt_encoded(self)
    }

    /// Fresh encryption of the all-zero vector.
    pub fn make_zero(&self) -> Result<Self> {
        self.backend.encrypt_vector(&self.backend.make_vector(B::Scalar::zero()))
    }

    /// Fresh encryption of the all-one vector.
    pub fn make_one(&self) -> Result<Self> {
        self.backend.encrypt_vector(&self.backend.make_vector(B::Scalar::one()))
    }

    /// Decrypt and read one slot.
    pub fn extract_at(&self, index: isize) -> Result<B::Scalar> {
        self.decrypt()?.get(index)
    }

    pub fn try_add(&self, rhs: &Self) -> Result<Self> {
        let mut out = self.clone();
        self.backend.add(&mut out, rhs)?;
        Ok(out)
    }

    pub fn try_add_plain(&self, rhs: &Encoded<'b, B>) -> Result<Self> {
        let mut out = self.clone();
        self.backend.add_plain(&mut out, rhs)?;
        Ok(out)
    }

    pub fn try_sub(&self, rhs: &Self) -> Result<Self> {
        let mut out = self.clone();
        self.backend.subtract(&mut out, rhs)?;
        Ok(out)
    }

    pub fn try_sub_plain(&self, rhs: &Encoded<'b, B>) -> Result<Self> {
        let mut out = self.clone();
        self.backend.subtract_plain(&mut out, rhs)?;
        Ok(out)
    }

    /// Maintained product, safe to multiply again.
    pub fn try_mul(&self, rhs: &Self) -> Result<Self> {
        let mut out = self.clone();
        self.backend.multiply_and_maintain(&mut out, rhs)?;
        Ok(out)
    }

    pub fn try_mul_plain(&self, rhs: &Encoded<'b, B>) -> Result<Self> {
        let mut out = self.clone();
        self.backend.multiply_plain_and_maintain(&mut out, rhs)?;
        Ok(out)
    }

    /// Product without maintenance. The result has degree 2 and must be
    /// relinearized before it takes part in another multiplication.
    pub fn multiply_raw(&self, rhs: &Self) -> Result<Self> {
        let mut out = self.clone();
        self.backend.multiply(&mut out, rhs)?;
        Ok(out)
    }

    pub fn try_neg(&self) -> Result<Self> {
        let mut out = self.clone();
        self.backend.negate(&mut out)?;
        Ok(out)
    }

    /// Rotate left by `k` slots; negative `k` rotates right.
    pub fn try_rotate(&self, k: i64) -> Result<Self> {
        let mut out = self.clone();
        self.backend.rotate(&mut out, k)?;
        Ok(out)
    }

    pub fn try_flip(&self) -> Result<Self> {
        let mut out = self.clone();
        self.backend.flip(&mut out)?;
        Ok(out)
    }

    pub fn relinearize(&mut self) -> Result<&mut Self> {
        let backend = self.backend;
        backend.relinearize(self)
    }

    pub fn modulus_switch(&mut self) -> Result<&mut Self> {
        let backend = self.backend;
        backend.modulus_switch(self)
    }

    /// Slot sum in slot 0.
    pub fn inner_sum(&self) -> Result<Self> {
        let mut out = self.clone();
        self.backend.inner_sum(&mut out)?;
        Ok(out)
    }
}

impl<B: Backend> SlotRotate for Encrypted<'_, B> {
    fn rotated(&self, k: i64) -> Result<Self> {
        self.try_rotate(k)
    }

    fn flipped(&self) -> Result<Self> {
        self.try_flip()
    }

    fn accumulate(&mut self, other: &Self) -> Result<()> {
        let backend = self.backend;
        backend.add(self, other)?;
        Ok(())
    }
}

impl<B: Backend> Clone for Encrypted<'_, B> {
    fn clone(&self) -> Self {
        Self { backend: self.backend, ciphertext: self.ciphertext.clone() }
    }
}

impl<B: Backend> fmt::Debug for Encrypted<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encrypted")
            .field("degree", &self.degree())
            .field("level", &self.level())
            .finish_non_exhaustive()
    }
}

use std::fmt;

use num_traits::{One, Zero};

use crate::backend::{Backend, Encrypted, Vector};
use crate::error::Result;

/// A vector packed into the scheme's plaintext polynomial, not yet encrypted.
pub struct Encoded<'b, B: Backend> {
    backend: &'b B,
    plaintext: B::Plaintext,
}

impl<'b, B: Backend> Encoded<'b, B> {
    pub(crate) fn from_parts(backend: &'b B, plaintext: B::Plaintext) -> Self {
        Self { backend, plaintext }
    }

    pub fn backend(&self) -> &'b B {
        self.backend
    }

    pub fn plaintext(&self) -> &B::Plaintext {
        &self.plaintext
    }

    pub fn decode(&self) -> Result<Vector<'b, B>> {
        self.backend.decode(self)
    }

    pub fn encrypt(&self) -> Result<Encrypted<'b, B>> {
        self.backend.encrypt(self)
    }

    pub fn make_zero(&self) -> Result<Self> {
        self.backend.encode(&self.backend.make_vector(B::Scalar::zero()))
    }

    pub fn make_one(&self) -> Result<Self> {
        self.backend.encode(&self.backend.make_vector(B::Scalar::one()))
    }
}

impl<B: Backend> Clone for Encoded<'_, B> {
    fn clone(&self) -> Self {
        Self { backend: self.backend, plaintext: self.plaintext.clone() }
    }
}

impl<B: Backend> fmt::Debug for Encoded<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoded").field("plaintext", &self.plaintext).finish()
    }
}

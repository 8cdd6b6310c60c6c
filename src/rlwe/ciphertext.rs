use crate::error::{HealError, Result};
use crate::ring::rns::RnsPoly;

/// RLWE ciphertext (c_0, ..., c_k) at a common level.
///
/// Fresh and relinearized ciphertexts have degree 1; a raw product has degree 2
/// and decrypts under (1, s, s²).
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub parts: Vec<RnsPoly>,
}

impl Ciphertext {
    pub fn new(parts: Vec<RnsPoly>) -> Self {
        Self { parts }
    }

    pub fn degree(&self) -> usize {
        self.parts.len().saturating_sub(1)
    }

    pub fn level(&self) -> usize {
        self.parts.first().map_or(0, RnsPoly::level)
    }

    /// Part-wise sum at a common level; a shorter ciphertext counts as zero-padded.
    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        self.check_level(other)?;
        for (i, part) in other.parts.iter().enumerate() {
            match self.parts.get_mut(i) {
                Some(own) => own.add_assign(part)?,
                None => self.parts.push(part.clone()),
            }
        }
        Ok(())
    }

    pub fn sub_assign(&mut self, other: &Self) -> Result<()> {
        self.check_level(other)?;
        for (i, part) in other.parts.iter().enumerate() {
            match self.parts.get_mut(i) {
                Some(own) => own.sub_assign(part)?,
                None => self.parts.push(part.neg()),
            }
        }
        Ok(())
    }

    pub fn neg_assign(&mut self) {
        for part in self.parts.iter_mut() {
            part.neg_assign();
        }
    }

    pub fn check_level(&self, other: &Self) -> Result<()> {
        if self.level() != other.level() {
            return Err(HealError::LevelMismatch { lhs: self.level(), rhs: other.level() });
        }
        Ok(())
    }

    /// Apply `f` to every part.
    pub(crate) fn map_parts<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&RnsPoly) -> Result<RnsPoly>,
    {
        Ok(Self { parts: self.parts.iter().map(f).collect::<Result<Vec<_>>>()? })
    }
}

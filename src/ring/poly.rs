use crate::error::{HealError, Result};
use crate::ring::modular::Modulus;

/// Polynomial in coefficient representation over Z_q[X]/(X^n + 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoeffPoly {
    pub coeffs: Vec<u64>,
    pub modulus: u64,
}

impl CoeffPoly {
    pub fn zero(n: usize, modulus: u64) -> Self {
        Self { coeffs: vec![0u64; n], modulus }
    }

    /// Build from unsigned coefficients, reducing each mod q.
    pub fn from_coeffs(mut coeffs: Vec<u64>, modulus: u64) -> Self {
        for c in coeffs.iter_mut() {
            *c %= modulus;
        }
        Self { coeffs, modulus }
    }

    /// Build from signed coefficients (e.g. sampled noise or centered digits).
    pub fn from_signed(coeffs: &[i128], modulus: u64) -> Self {
        let q = Modulus::new(modulus);
        Self {
            coeffs: coeffs.iter().map(|&c| q.reduce_i128(c)).collect(),
            modulus,
        }
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        let q = Modulus::new(self.modulus);
        let coeffs = self.coeffs.iter().zip(&other.coeffs).map(|(&a, &b)| q.add(a, b)).collect();
        Ok(Self { coeffs, modulus: self.modulus })
    }

    /// Schoolbook product in Z_q[X]/(X^n+1). Quadratic; reference for the NTT path.
    pub fn mul_naive(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        let n = self.len();
        let q = Modulus::new(self.modulus);
        let mut result = vec![0u64; n];
        for (i, &a) in self.coeffs.iter().enumerate().filter(|&(_, &a)| a != 0) {
            for (j, &b) in other.coeffs.iter().enumerate().filter(|&(_, &b)| b != 0) {
                let prod = q.mul(a, b);
                if i + j < n {
                    result[i + j] = q.add(result[i + j], prod);
                } else {
                    // X^n ≡ -1
                    result[i + j - n] = q.sub(result[i + j - n], prod);
                }
            }
        }
        Ok(Self { coeffs: result, modulus: self.modulus })
    }

    /// Galois automorphism σ_k: X ↦ X^k for odd k.
    ///
    /// X^i maps to X^{ik mod 2n}, and X^{n+j} = -X^j, so σ_k is a signed
    /// permutation of the coefficients.
    pub fn automorphism(&self, k: usize) -> Self {
        let n = self.len();
        let q = Modulus::new(self.modulus);
        let mut result = vec![0u64; n];
        for (i, &c) in self.coeffs.iter().enumerate() {
            let e = (i * k) % (2 * n);
            if e < n {
                result[e] = c;
            } else {
                result[e - n] = q.neg(c);
            }
        }
        Self { coeffs: result, modulus: self.modulus }
    }

    /// Centered coefficients in (-q/2, q/2].
    pub fn centered_coeffs(&self) -> Vec<i64> {
        let q = Modulus::new(self.modulus);
        self.coeffs.iter().map(|&c| q.center(c)).collect()
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.len() != other.len() {
            return Err(HealError::DimensionMismatch { expected: self.len(), got: other.len() });
        }
        if self.modulus != other.modulus {
            return Err(HealError::ModulusMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_signed() {
        let p = CoeffPoly::from_signed(&[-1, 0, 18, -35], 17);
        assert_eq!(p.coeffs, vec![16, 0, 1, 16]);
    }

    #[test]
    fn test_mul_naive_wraparound() {
        // X^3 · X^3 = X^6 = -X^2 in Z_17[X]/(X^4+1)
        let a = CoeffPoly::from_coeffs(vec![0, 0, 0, 1], 17);
        let c = a.mul_naive(&a).unwrap();
        assert_eq!(c.coeffs, vec![0, 0, 16, 0]);
    }

    #[test]
    fn test_automorphism_signed_permutation() {
        // σ_3 on 1 + X + X^2 + X^3 over X^4+1:
        // X ↦ X^3, X^2 ↦ X^6 = -X^2, X^3 ↦ X^9 = X
        let p = CoeffPoly::from_coeffs(vec![1, 1, 1, 1], 17);
        assert_eq!(p.automorphism(3).coeffs, vec![1, 1, 16, 1]);
    }

    #[test]
    fn test_automorphism_is_ring_homomorphism() {
        let a = CoeffPoly::from_coeffs(vec![3, 1, 4, 1, 5, 9, 2, 6], 97);
        let b = CoeffPoly::from_coeffs(vec![2, 7, 1, 8, 2, 8, 1, 8], 97);
        let k = 5;
        let lhs = a.mul_naive(&b).unwrap().automorphism(k);
        let rhs = a.automorphism(k).mul_naive(&b.automorphism(k)).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_automorphism_inverse() {
        // 5 · 13 = 65 ≡ 1 mod 16, so σ_13 undoes σ_5 at n = 8.
        let a = CoeffPoly::from_coeffs(vec![3, 1, 4, 1, 5, 9, 2, 6], 97);
        assert_eq!(a.automorphism(5).automorphism(13), a);
    }

    #[test]
    fn test_centered() {
        let a = CoeffPoly::from_coeffs(vec![0, 1, 16, 9], 17);
        assert_eq!(a.centered_coeffs(), vec![0, 1, -1, -8]);
    }

    #[test]
    fn test_dimension_checks() {
        let a = CoeffPoly::zero(4, 17);
        let b = CoeffPoly::zero(8, 17);
        assert!(matches!(a.add(&b), Err(HealError::DimensionMismatch { expected: 4, got: 8 })));
        let c = CoeffPoly::zero(4, 19);
        assert!(matches!(a.add(&c), Err(HealError::ModulusMismatch)));
    }
}

use std::sync::Arc;

use concrete_ntt::prime64::Plan;

use crate::error::{HealError, Result};
use crate::ring::modular::Modulus;
use crate::ring::poly::CoeffPoly;

/// Polynomial in NTT (evaluation) representation over Z_q[X]/(X^n + 1).
///
/// Products are pointwise; `concrete-ntt` handles the negacyclic twist and
/// picks the SIMD kernel at runtime.
#[derive(Clone, Debug)]
pub struct NttPoly {
    pub evals: Vec<u64>,
    pub modulus: Modulus,
    pub plan: Arc<Plan>,
}

/// Build an NTT plan for degree `n` and prime `q ≡ 1 (mod 2n)`.
pub fn make_plan(n: usize, q: u64) -> Result<Arc<Plan>> {
    if !n.is_power_of_two() || n < 16 {
        return Err(HealError::InvalidRingDegree(n));
    }
    let plan = Plan::try_new(n, q).ok_or_else(|| {
        HealError::InvalidParam(format!("cannot create NTT plan for n={n}, q={q} (need prime q ≡ 1 mod {})", 2 * n))
    })?;
    Ok(Arc::new(plan))
}

impl NttPoly {
    pub fn zero(plan: &Arc<Plan>) -> Self {
        let q = plan.modulus();
        Self {
            evals: vec![0u64; plan.ntt_size()],
            modulus: Modulus::new(q),
            plan: plan.clone(),
        }
    }

    /// Forward transform of coefficients already reduced mod q.
    pub fn from_coeff_poly(poly: &CoeffPoly, plan: &Arc<Plan>) -> Result<Self> {
        if poly.modulus != plan.modulus() {
            return Err(HealError::ModulusMismatch);
        }
        if poly.len() != plan.ntt_size() {
            return Err(HealError::DimensionMismatch { expected: plan.ntt_size(), got: poly.len() });
        }
        let mut evals = poly.coeffs.clone();
        plan.fwd(&mut evals);
        Ok(Self {
            evals,
            modulus: Modulus::new(poly.modulus),
            plan: plan.clone(),
        })
    }

    /// Inverse transform. `inv` leaves a factor n that `normalize` removes.
    pub fn to_coeff_poly(&self) -> CoeffPoly {
        let mut coeffs = self.evals.clone();
        self.plan.inv(&mut coeffs);
        self.plan.normalize(&mut coeffs);
        CoeffPoly { coeffs, modulus: self.modulus.value }
    }

    pub fn len(&self) -> usize {
        self.evals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evals.is_empty()
    }

    pub fn q(&self) -> u64 {
        self.modulus.value
    }

    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        self.check_compatible(other)?;
        let q = self.modulus;
        for (a, &b) in self.evals.iter_mut().zip(&other.evals) {
            *a = q.add(*a, b);
        }
        Ok(())
    }

    pub fn sub_assign(&mut self, other: &Self) -> Result<()> {
        self.check_compatible(other)?;
        let q = self.modulus;
        for (a, &b) in self.evals.iter_mut().zip(&other.evals) {
            *a = q.sub(*a, b);
        }
        Ok(())
    }

    pub fn neg_assign(&mut self) {
        let q = self.modulus;
        for a in self.evals.iter_mut() {
            *a = q.neg(*a);
        }
    }

    /// Pointwise product, i.e. the negacyclic polynomial product.
    pub fn mul_assign(&mut self, other: &Self) -> Result<()> {
        self.check_compatible(other)?;
        let q = self.modulus;
        for (a, &b) in self.evals.iter_mut().zip(&other.evals) {
            *a = q.mul(*a, b);
        }
        Ok(())
    }

    /// Multiply by a constant already reduced mod q.
    pub fn scalar_mul_assign(&mut self, scalar: u64) {
        let q = self.modulus;
        let s = scalar % q.value;
        for a in self.evals.iter_mut() {
            *a = q.mul(*a, s);
        }
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

impl PartialEq for NttPoly {
    fn eq(&self, other: &Self) -> bool {
        self.modulus == other.modulus && self.evals == other.evals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // concrete-ntt needs n ≥ 16; 65537 ≡ 1 (mod 32).
    const N: usize = 16;
    const Q: u64 = 65537;

    fn poly(v: &[u64]) -> CoeffPoly {
        let mut coeffs = vec![0u64; N];
        coeffs[..v.len()].copy_from_slice(v);
        CoeffPoly::from_coeffs(coeffs, Q)
    }

    #[test]
    fn test_ntt_roundtrip() {
        let plan = make_plan(N, Q).unwrap();
        let original = poly(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let ntt = NttPoly::from_coeff_poly(&original, &plan).unwrap();
        assert_eq!(ntt.to_coeff_poly(), original);
    }

    #[test]
    fn test_ntt_mul_matches_naive() {
        let plan = make_plan(N, Q).unwrap();
        let a = poly(&[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 7]);
        let b = poly(&[3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 5]);
        let expected = a.mul_naive(&b).unwrap();

        let mut a_ntt = NttPoly::from_coeff_poly(&a, &plan).unwrap();
        let b_ntt = NttPoly::from_coeff_poly(&b, &plan).unwrap();
        a_ntt.mul_assign(&b_ntt).unwrap();
        assert_eq!(a_ntt.to_coeff_poly(), expected);
    }

    #[test]
    fn test_ntt_add_sub_neg() {
        let plan = make_plan(N, Q).unwrap();
        let a = poly(&[1, 2, 3]);
        let b = poly(&[4, 5, Q - 1]);

        let mut acc = NttPoly::from_coeff_poly(&a, &plan).unwrap();
        let b_ntt = NttPoly::from_coeff_poly(&b, &plan).unwrap();
        acc.add_assign(&b_ntt).unwrap();
        assert_eq!(acc.to_coeff_poly(), a.add(&b).unwrap());

        acc.sub_assign(&b_ntt).unwrap();
        acc.neg_assign();
        acc.scalar_mul_assign(Q - 1);
        assert_eq!(acc.to_coeff_poly(), a);
    }

    #[test]
    fn test_plan_rejects_bad_modulus() {
        assert!(make_plan(N, 65539).is_err());
        assert!(matches!(make_plan(8, Q), Err(HealError::InvalidRingDegree(8))));
    }

    #[test]
    fn test_modulus_mismatch() {
        let plan = make_plan(N, Q).unwrap();
        let other = make_plan(N, 97).unwrap();
        let mut a = NttPoly::zero(&plan);
        let b = NttPoly::zero(&other);
        assert!(matches!(a.add_assign(&b), Err(HealError::ModulusMismatch)));
    }
}

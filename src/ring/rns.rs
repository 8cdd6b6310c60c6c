use std::sync::Arc;

use concrete_ntt::prime64::Plan;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::error::{HealError, Result};
use crate::ring::modular::Modulus;
use crate::ring::ntt::{make_plan, NttPoly};
use crate::ring::poly::CoeffPoly;

/// One prime of an RNS basis together with its NTT plan.
#[derive(Clone, Debug)]
pub struct RnsPrime {
    pub modulus: Modulus,
    pub plan: Arc<Plan>,
}

impl RnsPrime {
    pub fn new(q: u64, ring_degree: usize) -> Result<Self> {
        Ok(Self { modulus: Modulus::new(q), plan: make_plan(ring_degree, q)? })
    }

    pub fn q(&self) -> u64 {
        self.modulus.value
    }
}

/// Polynomial in RNS form: one `NttPoly` per prime, all in evaluation form.
///
/// The primes are carried by the components, so an `RnsPoly` describes its own
/// modulus Q = ∏ q_i. Ciphertext components over the chain prefix q_0..q_l are
/// at level l; key material additionally carries the special prime last.
#[derive(Clone, Debug, PartialEq)]
pub struct RnsPoly {
    pub components: Vec<NttPoly>,
    pub ring_degree: usize,
}

impl RnsPoly {
    pub fn zero(primes: &[RnsPrime], ring_degree: usize) -> Self {
        Self {
            components: primes.iter().map(|p| NttPoly::zero(&p.plan)).collect(),
            ring_degree,
        }
    }

    /// Lift small signed coefficients into every prime.
    pub fn from_signed(coeffs: &[i128], primes: &[RnsPrime]) -> Result<Self> {
        let components = primes
            .iter()
            .map(|p| NttPoly::from_coeff_poly(&CoeffPoly::from_signed(coeffs, p.q()), &p.plan))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { components, ring_degree: coeffs.len() })
    }

    /// Reduce arbitrary-precision coefficients into every prime.
    pub fn from_bigint(coeffs: &[BigInt], primes: &[RnsPrime]) -> Result<Self> {
        let components = primes
            .iter()
            .map(|p| {
                let residues = coeffs.iter().map(|c| bigint_mod(c, p.q())).collect();
                NttPoly::from_coeff_poly(&CoeffPoly { coeffs: residues, modulus: p.q() }, &p.plan)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { components, ring_degree: coeffs.len() })
    }

    /// Per-prime coefficient polynomials, which must match `primes` one to one.
    pub fn from_coeff_components(polys: &[CoeffPoly], primes: &[RnsPrime]) -> Result<Self> {
        if polys.len() != primes.len() {
            return Err(HealError::DimensionMismatch { expected: primes.len(), got: polys.len() });
        }
        let components = polys
            .iter()
            .zip(primes)
            .map(|(poly, p)| NttPoly::from_coeff_poly(poly, &p.plan))
            .collect::<Result<Vec<_>>>()?;
        let ring_degree = polys.first().map_or(0, CoeffPoly::len);
        Ok(Self { components, ring_degree })
    }

    pub fn to_coeff_components(&self) -> Vec<CoeffPoly> {
        self.components.iter().map(NttPoly::to_coeff_poly).collect()
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Index of the last component.
    pub fn level(&self) -> usize {
        self.components.len().saturating_sub(1)
    }

    pub fn primes(&self) -> Vec<RnsPrime> {
        self.components
            .iter()
            .map(|c| RnsPrime { modulus: c.modulus, plan: c.plan.clone() })
            .collect()
    }

    pub fn moduli(&self) -> Vec<u64> {
        self.components.iter().map(NttPoly::q).collect()
    }

    /// Components 0..=level.
    pub fn prefix(&self, level: usize) -> Self {
        Self {
            components: self.components[..=level.min(self.level())].to_vec(),
            ring_degree: self.ring_degree,
        }
    }

    /// Components 0..=level followed by the last (special) component.
    pub fn prefix_with_last(&self, level: usize) -> Self {
        let mut components = self.components[..=level].to_vec();
        if let Some(last) = self.components.last() {
            components.push(last.clone());
        }
        Self { components, ring_degree: self.ring_degree }
    }

    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        self.check_shape(other)?;
        for (a, b) in self.components.iter_mut().zip(&other.components) {
            a.add_assign(b)?;
        }
        Ok(())
    }

    pub fn sub_assign(&mut self, other: &Self) -> Result<()> {
        self.check_shape(other)?;
        for (a, b) in self.components.iter_mut().zip(&other.components) {
            a.sub_assign(b)?;
        }
        Ok(())
    }

    pub fn mul_assign(&mut self, other: &Self) -> Result<()> {
        self.check_shape(other)?;
        for (a, b) in self.components.iter_mut().zip(&other.components) {
            a.mul_assign(b)?;
        }
        Ok(())
    }

    pub fn neg_assign(&mut self) {
        for a in self.components.iter_mut() {
            a.neg_assign();
        }
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.add_assign(other)?;
        Ok(out)
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.sub_assign(other)?;
        Ok(out)
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.mul_assign(other)?;
        Ok(out)
    }

    pub fn neg(&self) -> Self {
        let mut out = self.clone();
        out.neg_assign();
        out
    }

    /// Multiply component i by `residues[i]`, i.e. by the integer with those residues.
    pub fn mul_residues_assign(&mut self, residues: &[u64]) -> Result<()> {
        if residues.len() != self.components.len() {
            return Err(HealError::DimensionMismatch { expected: self.components.len(), got: residues.len() });
        }
        for (c, &r) in self.components.iter_mut().zip(residues) {
            c.scalar_mul_assign(r);
        }
        Ok(())
    }

    /// Drop the last prime q_l and divide by it with rounding:
    /// c' = ⌊c / q_l⌉ mod (Q / q_l).
    ///
    /// In RNS this is c'_i = (c_i − [c_l]) · q_l^{-1} mod q_i, where [c_l] is the
    /// centered residue of the dropped component.
    pub fn divide_round_last(&self) -> Result<Self> {
        if self.components.len() < 2 {
            return Err(HealError::ModulusChainExhausted);
        }
        let (last, rest) = self.components.split_last().ok_or(HealError::ModulusChainExhausted)?;
        let q_last = last.q();
        let centered: Vec<i128> = last.to_coeff_poly().centered_coeffs().into_iter().map(i128::from).collect();

        let components = rest
            .iter()
            .map(|c| {
                let q = c.modulus;
                let inv = q.inv(q_last).ok_or(HealError::ModulusMismatch)?;
                let correction = NttPoly::from_coeff_poly(&CoeffPoly::from_signed(&centered, q.value), &c.plan)?;
                let mut out = c.clone();
                out.sub_assign(&correction)?;
                out.scalar_mul_assign(inv);
                Ok(out)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { components, ring_degree: self.ring_degree })
    }

    /// σ_k applied prime by prime.
    pub fn automorphism(&self, k: usize) -> Result<Self> {
        let components = self
            .components
            .iter()
            .map(|c| NttPoly::from_coeff_poly(&c.to_coeff_poly().automorphism(k), &c.plan))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { components, ring_degree: self.ring_degree })
    }

    /// Coefficients lifted to [0, Q).
    pub fn to_biguint(&self, crt: &CrtTable) -> Result<Vec<BigUint>> {
        let comps = self.crt_components(crt)?;
        Ok((0..self.ring_degree)
            .map(|j| crt.reconstruct(comps.iter().map(|c| c.coeffs[j])))
            .collect())
    }

    /// Coefficients lifted to (−Q/2, Q/2].
    pub fn to_bigint_centered(&self, crt: &CrtTable) -> Result<Vec<BigInt>> {
        let comps = self.crt_components(crt)?;
        Ok((0..self.ring_degree)
            .map(|j| crt.reconstruct_centered(comps.iter().map(|c| c.coeffs[j])))
            .collect())
    }

    fn crt_components(&self, crt: &CrtTable) -> Result<Vec<CoeffPoly>> {
        if self.moduli() != crt.moduli {
            return Err(HealError::ModulusMismatch);
        }
        Ok(self.to_coeff_components())
    }

    fn check_shape(&self, other: &Self) -> Result<()> {
        if self.components.len() != other.components.len() {
            return Err(HealError::DimensionMismatch {
                expected: self.components.len(),
                got: other.components.len(),
            });
        }
        Ok(())
    }
}

/// Residue of a signed big integer modulo a word-sized q, in [0, q).
pub fn bigint_mod(x: &BigInt, q: u64) -> u64 {
    let (sign, digits) = x.to_u64_digits();
    let q128 = q as u128;
    let r = digits.iter().rev().fold(0u128, |acc, &d| ((acc << 64) | d as u128) % q128) as u64;
    if sign == Sign::Minus && r != 0 { q - r } else { r }
}

/// Precomputed CRT reconstruction for a fixed list of primes.
#[derive(Clone, Debug)]
pub struct CrtTable {
    pub moduli: Vec<u64>,
    pub product: BigUint,
    reducers: Vec<Modulus>,
    half: BigUint,
    /// Q / q_i.
    punctured: Vec<BigUint>,
    /// (Q / q_i)^{-1} mod q_i.
    punctured_inv: Vec<u64>,
}

impl CrtTable {
    pub fn new(moduli: &[u64]) -> Result<Self> {
        if moduli.is_empty() {
            return Err(HealError::InvalidParam("CRT basis must not be empty".into()));
        }
        let product = moduli.iter().fold(BigUint::one(), |acc, &q| acc * q);
        let mut punctured = Vec::with_capacity(moduli.len());
        let mut punctured_inv = Vec::with_capacity(moduli.len());
        for &q in moduli {
            let m = Modulus::new(q);
            let star = &product / q;
            let star_mod_q = bigint_mod(&BigInt::from(star.clone()), q);
            let inv = m
                .inv(star_mod_q)
                .ok_or_else(|| HealError::InvalidParam(format!("CRT moduli are not coprime at {q}")))?;
            punctured.push(star);
            punctured_inv.push(inv);
        }
        let half = &product >> 1u32;
        let reducers = moduli.iter().map(|&q| Modulus::new(q)).collect();
        Ok(Self { moduli: moduli.to_vec(), product, reducers, half, punctured, punctured_inv })
    }

    pub fn bits(&self) -> u64 {
        self.product.bits()
    }

    /// The unique x in [0, Q) with the given residues.
    pub fn reconstruct<I: IntoIterator<Item = u64>>(&self, residues: I) -> BigUint {
        let mut acc = BigUint::zero();
        for (i, r) in residues.into_iter().enumerate() {
            let t = self.reducers[i].mul(r, self.punctured_inv[i]);
            if t != 0 {
                acc += &self.punctured[i] * t;
            }
        }
        // Each term is below Q, so at most `len` subtractions.
        while acc >= self.product {
            acc -= &self.product;
        }
        acc
    }

    /// The unique x in (−Q/2, Q/2] with the given residues.
    pub fn reconstruct_centered<I: IntoIterator<Item = u64>>(&self, residues: I) -> BigInt {
        let x = self.reconstruct(residues);
        if x > self.half {
            BigInt::from(x) - BigInt::from(self.product.clone())
        } else {
            BigInt::from(x)
        }
    }
}

use std::collections::BTreeMap;

use rand::Rng;
use tracing::instrument;
use zeroize::Zeroize;

use crate::error::{HealError, Result};
use crate::ring::rns::RnsPoly;
use crate::rlwe::ciphertext::Ciphertext;
use crate::rlwe::context::RlweContext;
use crate::sampling::{sample_gaussian, sample_ternary, sample_uniform_rns, NOISE_SIGMA};

/// Ternary secret s, held over every prime of the parameter set (including P).
pub struct SecretKey {
    poly: RnsPoly,
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        for comp in &mut self.poly.components {
            comp.evals.zeroize();
        }
    }
}

impl SecretKey {
    pub fn generate<R: Rng + ?Sized>(ctx: &RlweContext, rng: &mut R) -> Result<Self> {
        let mut coeffs = sample_ternary(ctx.degree, rng);
        let poly = RnsPoly::from_signed(&coeffs, &ctx.all_primes());
        coeffs.zeroize();
        Ok(Self { poly: poly? })
    }

    /// s modulo Q_level.
    pub fn at_level(&self, level: usize) -> RnsPoly {
        self.poly.prefix(level)
    }

    /// c_0 + c_1·s + ... + c_k·s^k at the ciphertext's level, by Horner's rule.
    pub fn phase(&self, ct: &Ciphertext) -> Result<RnsPoly> {
        let s = self.at_level(ct.level());
        let (last, rest) = ct.parts.split_last().ok_or(HealError::NotLinear { degree: 0 })?;
        let mut acc = last.clone();
        for part in rest.iter().rev() {
            acc.mul_assign(&s)?;
            acc.add_assign(part)?;
        }
        Ok(acc)
    }
}

/// Encryption key (−(a·s + e), a) at the top of the chain.
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub pk0: RnsPoly,
    pub pk1: RnsPoly,
}

impl PublicKey {
    pub fn generate<R: Rng + ?Sized>(ctx: &RlweContext, sk: &SecretKey, rng: &mut R) -> Result<Self> {
        let top = ctx.max_level();
        let primes = ctx.primes_at(top);
        let a = sample_uniform_rns(ctx.degree, primes, rng)?;
        let e = RnsPoly::from_signed(&sample_gaussian(ctx.degree, NOISE_SIGMA, rng), primes)?;
        let mut pk0 = a.mul(&sk.at_level(top))?;
        pk0.add_assign(&e)?;
        pk0.neg_assign();
        Ok(Self { pk0, pk1: a })
    }

    /// (pk0·u + e1 + m, pk1·u + e2) for a message already scaled into R_Q.
    pub fn encrypt<R: Rng + ?Sized>(&self, ctx: &RlweContext, message: &RnsPoly, rng: &mut R) -> Result<Ciphertext> {
        let primes = ctx.primes_at(ctx.max_level());
        let u = RnsPoly::from_signed(&sample_ternary(ctx.degree, rng), primes)?;
        let e1 = RnsPoly::from_signed(&sample_gaussian(ctx.degree, NOISE_SIGMA, rng), primes)?;
        let e2 = RnsPoly::from_signed(&sample_gaussian(ctx.degree, NOISE_SIGMA, rng), primes)?;

        let mut c0 = self.pk0.mul(&u)?;
        c0.add_assign(&e1)?;
        c0.add_assign(message)?;
        let mut c1 = self.pk1.mul(&u)?;
        c1.add_assign(&e2)?;
        Ok(Ciphertext::new(vec![c0, c1]))
    }
}

/// Key switching key from a secret s' to s over the basis {q_0..q_L, P}.
///
/// Digit i is (−(a_i·s + e_i) + P·g_i·s', a_i) where g_i is the CRT idempotent
/// of q_i, so g_i ≡ 1 mod q_i and ≡ 0 mod every other prime.
#[derive(Clone, Debug)]
pub struct KeySwitchKey {
    pub digits: Vec<(RnsPoly, RnsPoly)>,
}

impl KeySwitchKey {
    /// `from` is s' over the whole parameter set.
    pub fn generate<R: Rng + ?Sized>(
        ctx: &RlweContext,
        sk: &SecretKey,
        from: &RnsPoly,
        rng: &mut R,
    ) -> Result<Self> {
        let special = ctx.special.as_ref().ok_or(HealError::KeySwitchUnavailable)?;
        let top = ctx.max_level();
        let basis = ctx.key_basis(top)?;
        let p = special.q();

        let mut digits = Vec::with_capacity(top + 1);
        for i in 0..=top {
            let a = sample_uniform_rns(ctx.degree, &basis, rng)?;
            let e = RnsPoly::from_signed(&sample_gaussian(ctx.degree, NOISE_SIGMA, rng), &basis)?;
            let mut k0 = a.mul(&sk.poly)?;
            k0.add_assign(&e)?;
            k0.neg_assign();

            let mut gadget = vec![0u64; basis.len()];
            gadget[i] = p % basis[i].q();
            let mut term = from.clone();
            term.mul_residues_assign(&gadget)?;
            k0.add_assign(&term)?;
            digits.push((k0, a));
        }
        Ok(Self { digits })
    }

    /// Returns (d0, d1) at the level of `c` with d0 + d1·s ≈ c·s'.
    pub fn switch(&self, ctx: &RlweContext, c: &RnsPoly) -> Result<(RnsPoly, RnsPoly)> {
        let level = c.level();
        let basis = ctx.key_basis(level)?;
        let mut acc0 = RnsPoly::zero(&basis, ctx.degree);
        let mut acc1 = RnsPoly::zero(&basis, ctx.degree);

        for (i, component) in c.to_coeff_components().iter().enumerate() {
            let (k0, k1) = self.digits.get(i).ok_or(HealError::LevelMismatch { lhs: level, rhs: self.digits.len() - 1 })?;
            let digit: Vec<i128> = component.centered_coeffs().into_iter().map(i128::from).collect();
            let d = RnsPoly::from_signed(&digit, &basis)?;
            acc0.add_assign(&d.mul(&k0.prefix_with_last(level))?)?;
            acc1.add_assign(&d.mul(&k1.prefix_with_last(level))?)?;
        }
        Ok((acc0.divide_round_last()?, acc1.divide_round_last()?))
    }
}

/// Galois element 5^step mod 2n: rotates each row left by `step` slots.
pub fn galois_element(step: usize, degree: usize) -> usize {
    let m = 2 * degree;
    (0..step).fold(1usize, |acc, _| acc * 5 % m)
}

/// The element 2n − 1: row swap for BFV, complex conjugation for CKKS.
pub fn reflection_element(degree: usize) -> usize {
    2 * degree - 1
}

/// Power-of-two left steps whose sum is k mod `row`.
pub fn rotation_steps(k: i64, row: usize) -> Vec<usize> {
    let r = k.rem_euclid(row as i64) as usize;
    (0..usize::BITS).map(|b| 1usize << b).filter(|&bit| r & bit != 0).collect()
}

/// Galois keys for 5^(2^i) for every power of two below n/2, and for 2n − 1.
pub struct GaloisKeys {
    keys: BTreeMap<usize, KeySwitchKey>,
}

impl GaloisKeys {
    #[instrument(skip_all, fields(degree = ctx.degree))]
    pub fn generate<R: Rng + ?Sized>(ctx: &RlweContext, sk: &SecretKey, rng: &mut R) -> Result<Self> {
        let row = ctx.degree / 2;
        let mut elements: Vec<usize> = (0..row.trailing_zeros())
            .map(|i| galois_element(1 << i, ctx.degree))
            .collect();
        elements.push(reflection_element(ctx.degree));

        let mut keys = BTreeMap::new();
        for element in elements {
            let from = sk.poly.automorphism(element)?;
            keys.insert(element, KeySwitchKey::generate(ctx, sk, &from, rng)?);
        }
        Ok(Self { keys })
    }

    pub fn get(&self, element: usize) -> Result<&KeySwitchKey> {
        self.keys.get(&element).ok_or(HealError::MissingRotationKey(element))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Relinearization key: switches s² to s.
pub fn relinearization_key<R: Rng + ?Sized>(ctx: &RlweContext, sk: &SecretKey, rng: &mut R) -> Result<KeySwitchKey> {
    let s_squared = sk.poly.mul(&sk.poly)?;
    KeySwitchKey::generate(ctx, sk, &s_squared, rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_galois_element() {
        assert_eq!(galois_element(0, 16), 1);
        assert_eq!(galois_element(1, 16), 5);
        assert_eq!(galois_element(2, 16), 25);
        assert_eq!(galois_element(3, 16), 125 % 32);
        assert_eq!(reflection_element(16), 31);
    }

    #[test]
    fn test_rotation_steps() {
        assert_eq!(rotation_steps(5, 8), vec![1, 4]);
        assert_eq!(rotation_steps(-1, 8), vec![1, 2, 4]);
        assert_eq!(rotation_steps(8, 8), Vec::<usize>::new());
        assert_eq!(rotation_steps(-6, 8), vec![2]);
    }
}

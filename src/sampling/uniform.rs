use rand::Rng;

use crate::error::Result;
use crate::ring::poly::CoeffPoly;
use crate::ring::rns::{RnsPoly, RnsPrime};

/// `n` coefficients uniform in [0, modulus), by rejection sampling on a bit mask.
pub fn sample_uniform<R: Rng + ?Sized>(n: usize, modulus: u64, rng: &mut R) -> Vec<u64> {
    let mask = if modulus.is_power_of_two() {
        modulus - 1
    } else {
        (1u64 << (64 - modulus.leading_zeros())) - 1
    };
    (0..n)
        .map(|_| loop {
            let val = rng.random::<u64>() & mask;
            if val < modulus {
                break val;
            }
        })
        .collect()
}

/// Uniform element of R_Q, sampled independently in each prime.
pub fn sample_uniform_rns<R: Rng + ?Sized>(n: usize, primes: &[RnsPrime], rng: &mut R) -> Result<RnsPoly> {
    let polys: Vec<CoeffPoly> = primes
        .iter()
        .map(|p| CoeffPoly { coeffs: sample_uniform(n, p.q(), rng), modulus: p.q() })
        .collect();
    RnsPoly::from_coeff_components(&polys, primes)
}

/// `n` ternary coefficients, each of −1, 0, 1 with probability 1/3.
pub fn sample_ternary<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<i128> {
    (0..n)
        .map(|_| {
            let val = loop {
                let r = rng.random::<u8>() & 0x03;
                if r < 3 {
                    break r;
                }
            };
            val as i128 - 1
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_uniform() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let coeffs = sample_uniform(1024, 65537, &mut rng);
        assert_eq!(coeffs.len(), 1024);
        assert!(coeffs.iter().all(|&c| c < 65537));
    }

    #[test]
    fn test_uniform_rns_shape() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let primes: Vec<RnsPrime> = [65537, 40961].iter().map(|&q| RnsPrime::new(q, 16).unwrap()).collect();
        let poly = sample_uniform_rns(16, &primes, &mut rng).unwrap();
        assert_eq!(poly.moduli(), vec![65537, 40961]);
    }

    #[test]
    fn test_ternary() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let coeffs = sample_ternary(1024, &mut rng);
        assert!(coeffs.iter().all(|c| (-1..=1).contains(c)));
        for v in -1..=1 {
            let count = coeffs.iter().filter(|&&c| c == v).count();
            assert!(count > 200 && count < 500, "{v}: {count}");
        }
    }
}

//! NTT-friendly prime search.
//!
//! Every modulus in this crate, ciphertext or plaintext, is a prime q ≡ 1 (mod 2n)
//! so that X^n + 1 splits completely modulo q.

use crate::error::{HealError, Result};
use crate::ring::modular::mod_pow;

/// Deterministic Miller–Rabin for 64-bit integers.
///
/// The first twelve primes as witnesses are sufficient for every n < 3.3·10^24.
pub fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }
    let mut d = n - 1;
    let mut r = 0;
    while d % 2 == 0 {
        d /= 2;
        r += 1;
    }
    'witness: for &a in &WITNESSES {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = ((x as u128 * x as u128) % n as u128) as u64;
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Largest `count` primes of exactly `bits` bits with q ≡ 1 (mod 2·degree),
/// in descending order, skipping anything in `exclude`.
pub fn ntt_primes(bits: u32, count: usize, degree: usize, exclude: &[u64]) -> Result<Vec<u64>> {
    if !(2..=61).contains(&bits) {
        return Err(HealError::InvalidParam(format!("prime size {bits} outside [2, 61] bits")));
    }
    let step = 2 * degree as u64;
    let upper = 1u64 << bits;
    let lower = 1u64 << (bits - 1);
    let mut primes = Vec::with_capacity(count);
    if upper <= step {
        return Err(HealError::InvalidParam(format!(
            "no {bits}-bit prime can be 1 mod {step}"
        )));
    }
    // Largest value ≡ 1 (mod step) strictly below 2^bits.
    let mut candidate = upper - step + 1;
    while primes.len() < count {
        if candidate <= lower {
            return Err(HealError::InvalidParam(format!(
                "not enough {bits}-bit primes ≡ 1 mod {step} (found {})",
                primes.len()
            )));
        }
        if is_prime(candidate) && !exclude.contains(&candidate) {
            primes.push(candidate);
        }
        candidate -= step;
    }
    Ok(primes)
}

/// Generate one distinct NTT prime per requested bit size, in the order given.
pub fn chain_from_bit_sizes(bit_sizes: &[u32], degree: usize, exclude: &[u64]) -> Result<Vec<u64>> {
    let mut taken: Vec<u64> = exclude.to_vec();
    let mut chain = Vec::with_capacity(bit_sizes.len());
    for &bits in bit_sizes {
        let q = ntt_primes(bits, 1, degree, &taken)?[0];
        taken.push(q);
        chain.push(q);
    }
    Ok(chain)
}

/// Plain modulus supporting batching at `degree`.
///
/// Starting from `min_bits`, the first bit width containing a prime ≡ 1 (mod 2·degree)
/// wins, and the largest such prime of that width is returned.
pub fn find_plain_modulus(degree: usize, min_bits: u32) -> Result<u64> {
    let step_bits = (2 * degree).trailing_zeros() + 1;
    for bits in min_bits.max(step_bits)..=60 {
        if let Ok(found) = ntt_primes(bits, 1, degree, &[]) {
            return Ok(found[0]);
        }
    }
    Err(HealError::InvalidParam(format!(
        "no batching plain modulus of at least {min_bits} bits for degree {degree}"
    )))
}

/// Bit width of `x` (0 for 0).
pub fn bit_width(x: u64) -> u32 {
    u64::BITS - x.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_prime_small() {
        let primes: Vec<u64> = (0..60).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59]);
    }

    #[test]
    fn test_is_prime_large() {
        assert!(is_prime(65537));
        assert!(is_prime(1152921504606830593));
        assert!(!is_prime(65537 * 65539));
        // Strong pseudoprime to bases 2, 3, 5, 7.
        assert!(!is_prime(3215031751));
    }

    #[test]
    fn test_ntt_primes_congruence() {
        let primes = ntt_primes(36, 3, 4096, &[]).unwrap();
        assert_eq!(primes.len(), 3);
        for &q in &primes {
            assert_eq!(q % 8192, 1);
            assert_eq!(bit_width(q), 36);
            assert!(is_prime(q));
        }
        assert!(primes.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_chain_is_distinct() {
        let chain = chain_from_bit_sizes(&[40, 40, 40], 4096, &[]).unwrap();
        assert_ne!(chain[0], chain[1]);
        assert_ne!(chain[1], chain[2]);
    }

    #[test]
    fn test_find_plain_modulus() {
        // Largest 17-bit prime ≡ 1 mod 8192.
        assert_eq!(find_plain_modulus(4096, 17).unwrap(), 114689);
        assert_eq!(find_plain_modulus(4096, 20).unwrap(), 1032193);
        // No 14- or 15-bit prime is 1 mod 8192, the search moves up to 16 bits.
        assert_eq!(find_plain_modulus(4096, 14).unwrap(), 40961);
    }

    #[test]
    fn test_bit_width() {
        assert_eq!(bit_width(0), 0);
        assert_eq!(bit_width(1), 1);
        assert_eq!(bit_width(65537), 17);
    }
}

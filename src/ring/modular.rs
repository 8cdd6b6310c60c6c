//! Word-sized modular arithmetic.

/// Barrett reduction of a double-word value.
///
/// With k = ⌊2^64 / m⌋ the quotient estimate is off by at most one for
/// a < m² when m ≤ 2^32. Wider moduli fall back to native u128 division.
#[inline(always)]
pub fn barrett_reduce(a: u128, m: u64, barrett_k: u64) -> u64 {
    if m > (1u64 << 32) {
        (a % m as u128) as u64
    } else {
        let q_hat = ((a * barrett_k as u128) >> 64) as u64;
        let r = (a as u64).wrapping_sub(q_hat.wrapping_mul(m));
        if r >= m { r.wrapping_sub(m) } else { r }
    }
}

/// Barrett constant ⌊2^64 / m⌋.
#[inline]
pub fn barrett_constant(m: u64) -> u64 {
    assert!(m > 1, "modulus must be > 1");
    ((1u128 << 64) / m as u128) as u64
}

/// a^exp mod m.
pub fn mod_pow(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let bk = barrett_constant(m);
    let mut result = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = barrett_reduce(result as u128 * base as u128, m, bk);
        }
        exp >>= 1;
        base = barrett_reduce(base as u128 * base as u128, m, bk);
    }
    result
}

/// a^{-1} mod m by the extended Euclidean algorithm, `None` if gcd(a, m) ≠ 1.
pub fn mod_inv(a: u64, m: u64) -> Option<u64> {
    let (mut old_r, mut r) = (a as i128, m as i128);
    let (mut old_s, mut s) = (1i128, 0i128);

    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }

    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(m as i128) as u64)
}

/// A word-sized modulus with its Barrett constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Modulus {
    pub value: u64,
    pub barrett_k: u64,
}

impl Modulus {
    pub fn new(value: u64) -> Self {
        Self { value, barrett_k: barrett_constant(value) }
    }

    #[inline(always)]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        let sum = a as u128 + b as u128;
        if sum >= self.value as u128 { (sum - self.value as u128) as u64 } else { sum as u64 }
    }

    #[inline(always)]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        if a >= b { a - b } else { self.value - b + a }
    }

    #[inline(always)]
    pub fn neg(&self, a: u64) -> u64 {
        if a == 0 { 0 } else { self.value - a }
    }

    #[inline(always)]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        barrett_reduce(a as u128 * b as u128, self.value, self.barrett_k)
    }

    pub fn pow(&self, base: u64, exp: u64) -> u64 {
        mod_pow(base, exp, self.value)
    }

    pub fn inv(&self, a: u64) -> Option<u64> {
        mod_inv(a % self.value, self.value)
    }

    /// Reduce a signed value into [0, q).
    #[inline]
    pub fn reduce_i128(&self, x: i128) -> u64 {
        x.rem_euclid(self.value as i128) as u64
    }

    /// Centered representative in (-q/2, q/2].
    #[inline]
    pub fn center(&self, a: u64) -> i64 {
        if a > self.value / 2 { a as i64 - self.value as i64 } else { a as i64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barrett_reduce() {
        let m = 65537u64;
        let bk = barrett_constant(m);
        assert_eq!(barrett_reduce(0, m, bk), 0);
        assert_eq!(barrett_reduce(m as u128 + 1, m, bk), 1);
        assert_eq!(barrett_reduce(123456789u128, m, bk), (123456789u128 % m as u128) as u64);
        assert_eq!(barrett_reduce((m as u128 - 1) * (m as u128 - 1), m, bk), 1);
    }

    #[test]
    fn test_modulus_ops() {
        let q = Modulus::new(65537);
        assert_eq!(q.add(65536, 2), 1);
        assert_eq!(q.sub(100, 200), 65437);
        assert_eq!(q.neg(0), 0);
        assert_eq!(q.neg(1), 65536);
        assert_eq!(q.mul(1234, 5678), ((1234u128 * 5678) % 65537) as u64);
        assert_eq!(q.pow(3, 65536), 1);
    }

    #[test]
    fn test_wide_modulus() {
        let q = Modulus::new(1152921504606830593);
        let a = q.value - 1;
        assert_eq!(q.mul(a, a), 1);
        assert_eq!(q.add(a, 5), 4);
    }

    #[test]
    fn test_mod_inv() {
        let q = Modulus::new(65537);
        let inv = q.inv(12345).unwrap();
        assert_eq!(q.mul(12345, inv), 1);
        assert_eq!(mod_inv(6, 9), None);
    }

    #[test]
    fn test_center_and_reduce() {
        let q = Modulus::new(17);
        assert_eq!(q.center(0), 0);
        assert_eq!(q.center(8), 8);
        assert_eq!(q.center(9), -8);
        assert_eq!(q.center(16), -1);
        assert_eq!(q.reduce_i128(-1), 16);
        assert_eq!(q.reduce_i128(-35), 16);
    }
}

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::error::{HealError, Result};

/// Canonical-embedding encoder for n/2 complex slots.
///
/// Slot j is the value at the root ζ^(5^j) of X^n + 1, where ζ = e^(iπ/n).
/// Both transforms are the special FFT over the 5-power rotation group, so
/// σ_5 rotates the slots left by one and σ_{2n−1} conjugates them.
#[derive(Clone, Debug)]
pub struct CkksEncoder {
    degree: usize,
    slots: usize,
    /// 5^j mod 2n.
    rot_group: Vec<usize>,
    /// e^(2πik / 2n) for k in 0..=2n.
    ksi_pows: Vec<Complex64>,
}

impl CkksEncoder {
    pub fn new(degree: usize) -> Result<Self> {
        if !degree.is_power_of_two() || degree < 4 {
            return Err(HealError::InvalidRingDegree(degree));
        }
        let m = 2 * degree;
        let slots = degree / 2;
        let mut rot_group = Vec::with_capacity(slots);
        let mut g = 1usize;
        for _ in 0..slots {
            rot_group.push(g);
            g = g * 5 % m;
        }
        let ksi_pows = (0..=m)
            .map(|k| Complex64::from_polar(1.0, 2.0 * PI * k as f64 / m as f64))
            .collect();
        Ok(Self { degree, slots, rot_group, ksi_pows })
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Coefficients of ⌊Δ·m⌉ where m has the given slot values.
    pub fn encode(&self, values: &[Complex64], scale: f64) -> Result<Vec<i128>> {
        if values.len() != self.slots {
            return Err(HealError::DimensionMismatch { expected: self.slots, got: values.len() });
        }
        if values.iter().any(|v| !v.re.is_finite() || !v.im.is_finite()) {
            return Err(HealError::InvalidParam("slot values must be finite".into()));
        }
        let mut a = values.to_vec();
        self.fft_special_inv(&mut a);

        let mut coeffs = vec![0i128; self.degree];
        for (i, v) in a.iter().enumerate() {
            coeffs[i] = (v.re * scale).round() as i128;
            coeffs[i + self.slots] = (v.im * scale).round() as i128;
        }
        Ok(coeffs)
    }

    /// Slot values of a polynomial whose coefficients are `coeffs / scale`.
    pub fn decode(&self, coeffs: &[f64], scale: f64) -> Result<Vec<Complex64>> {
        if coeffs.len() != self.degree {
            return Err(HealError::DimensionMismatch { expected: self.degree, got: coeffs.len() });
        }
        let mut a: Vec<Complex64> = (0..self.slots)
            .map(|i| Complex64::new(coeffs[i] / scale, coeffs[i + self.slots] / scale))
            .collect();
        self.fft_special(&mut a);
        Ok(a)
    }

    fn fft_special(&self, a: &mut [Complex64]) {
        let size = a.len();
        bit_reverse(a);
        let m = 2 * self.degree;
        let mut len = 2;
        while len <= size {
            let lenh = len >> 1;
            let lenq = len << 2;
            let gap = m / lenq;
            for start in (0..size).step_by(len) {
                for j in 0..lenh {
                    let idx = (self.rot_group[j] % lenq) * gap;
                    let u = a[start + j];
                    let v = a[start + j + lenh] * self.ksi_pows[idx];
                    a[start + j] = u + v;
                    a[start + j + lenh] = u - v;
                }
            }
            len <<= 1;
        }
    }

    fn fft_special_inv(&self, a: &mut [Complex64]) {
        let size = a.len();
        let m = 2 * self.degree;
        let mut len = size;
        while len >= 1 {
            let lenh = len >> 1;
            let lenq = len << 2;
            let gap = m / lenq;
            for start in (0..size).step_by(len) {
                for j in 0..lenh {
                    let idx = (lenq - (self.rot_group[j] % lenq)) * gap;
                    let u = a[start + j] + a[start + j + lenh];
                    let v = (a[start + j] - a[start + j + lenh]) * self.ksi_pows[idx];
                    a[start + j] = u;
                    a[start + j + lenh] = v;
                }
            }
            len >>= 1;
        }
        bit_reverse(a);
        let inv = 1.0 / size as f64;
        for v in a.iter_mut() {
            *v *= inv;
        }
    }
}

fn bit_reverse<T>(a: &mut [T]) {
    let n = a.len();
    if n < 2 {
        return;
    }
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if i < j {
            a.swap(i, j);
        }
    }
}

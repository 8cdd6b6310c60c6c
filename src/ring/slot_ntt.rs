use crate::error::{HealError, Result};
use crate::ring::modular::Modulus;

/// Batching transform over the plaintext field Z_p, p ≡ 1 (mod 2n).
///
/// X^n + 1 splits into n linear factors mod p, so a plaintext polynomial is
/// determined by its values at the odd powers ψ^(2k+1) of a primitive 2n-th
/// root ψ. Slots are those values, arranged as two rows of n/2 so that σ_5
/// rotates each row left by one and σ_{2n−1} swaps the rows.
#[derive(Clone, Debug)]
pub struct SlotNtt {
    n: usize,
    p: Modulus,
    psi_pows: Vec<u64>,
    psi_inv_pows: Vec<u64>,
    omega: u64,
    omega_inv: u64,
    n_inv: u64,
    /// Slot s lives at evaluation index `slot_index[s]`.
    slot_index: Vec<usize>,
}

impl SlotNtt {
    pub fn new(n: usize, p: u64) -> Result<Self> {
        if !n.is_power_of_two() || n < 2 {
            return Err(HealError::InvalidRingDegree(n));
        }
        let two_n = 2 * n as u64;
        if p < 3 || (p - 1) % two_n != 0 {
            return Err(HealError::PlainModulusNotBatching { modulus: p, degree: n });
        }
        let m = Modulus::new(p);
        let psi = (2..p)
            .map(|g| m.pow(g, (p - 1) / two_n))
            .find(|&x| m.pow(x, n as u64) == p - 1)
            .ok_or(HealError::PlainModulusNotBatching { modulus: p, degree: n })?;
        let psi_inv = m.inv(psi).ok_or(HealError::PlainModulusNotBatching { modulus: p, degree: n })?;
        let n_inv = m.inv(n as u64 % p).ok_or(HealError::PlainModulusNotBatching { modulus: p, degree: n })?;

        let powers = |base: u64| {
            let mut out = Vec::with_capacity(n);
            let mut acc = 1u64;
            for _ in 0..n {
                out.push(acc);
                acc = m.mul(acc, base);
            }
            out
        };
        let psi_pows = powers(psi);
        let psi_inv_pows = powers(psi_inv);

        let row = n / 2;
        let mut slot_index = vec![0usize; n];
        let mut g = 1usize;
        for r in 0..row {
            slot_index[r] = (g - 1) / 2;
            slot_index[row + r] = (2 * n - g - 1) / 2;
            g = g * 5 % (2 * n);
        }

        Ok(Self {
            n,
            p: m,
            psi_pows,
            psi_inv_pows,
            omega: m.mul(psi, psi),
            omega_inv: m.mul(psi_inv, psi_inv),
            n_inv,
            slot_index,
        })
    }

    pub fn plain_modulus(&self) -> u64 {
        self.p.value
    }

    /// Slot values to plaintext coefficients.
    pub fn encode(&self, slots: &[u64]) -> Result<Vec<u64>> {
        if slots.len() != self.n {
            return Err(HealError::DimensionMismatch { expected: self.n, got: slots.len() });
        }
        let mut evals = vec![0u64; self.n];
        for (&v, &k) in slots.iter().zip(&self.slot_index) {
            if v >= self.p.value {
                return Err(HealError::ValueOutOfRange { value: v, modulus: self.p.value });
            }
            evals[k] = v;
        }
        self.cyclic_ntt(&mut evals, self.omega_inv);
        let p = self.p;
        Ok(evals
            .iter()
            .zip(&self.psi_inv_pows)
            .map(|(&a, &w)| p.mul(p.mul(a, self.n_inv), w))
            .collect())
    }

    /// Plaintext coefficients to slot values.
    pub fn decode(&self, coeffs: &[u64]) -> Result<Vec<u64>> {
        if coeffs.len() != self.n {
            return Err(HealError::DimensionMismatch { expected: self.n, got: coeffs.len() });
        }
        let p = self.p;
        let mut evals: Vec<u64> = coeffs.iter().zip(&self.psi_pows).map(|(&c, &w)| p.mul(c % p.value, w)).collect();
        self.cyclic_ntt(&mut evals, self.omega);
        Ok(self.slot_index.iter().map(|&k| evals[k]).collect())
    }

    /// In-place iterative Cooley–Tukey transform A_k = Σ_j a_j·root^(jk).
    fn cyclic_ntt(&self, a: &mut [u64], root: u64) {
        let n = a.len();
        let bits = n.trailing_zeros();
        for i in 0..n {
            let j = i.reverse_bits() >> (usize::BITS - bits);
            if i < j {
                a.swap(i, j);
            }
        }
        let p = self.p;
        let mut len = 2;
        while len <= n {
            let w_len = p.pow(root, (n / len) as u64);
            for start in (0..n).step_by(len) {
                let mut w = 1u64;
                for j in 0..len / 2 {
                    let u = a[start + j];
                    let v = p.mul(a[start + j + len / 2], w);
                    a[start + j] = p.add(u, v);
                    a[start + j + len / 2] = p.sub(u, v);
                    w = p.mul(w, w_len);
                }
            }
            len <<= 1;
        }
    }
}

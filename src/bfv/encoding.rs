use crate::error::Result;
use crate::ring::modular::Modulus;
use crate::ring::slot_ntt::SlotNtt;

/// Plaintext polynomial with coefficients in [0, p).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BfvPlaintext {
    pub coeffs: Vec<u64>,
}

impl BfvPlaintext {
    /// Coefficients in (−p/2, p/2], which keeps plaintext products small.
    pub fn centered(&self, p: Modulus) -> Vec<i128> {
        self.coeffs.iter().map(|&c| p.center(c) as i128).collect()
    }
}

/// Pack n slot values in [0, p) into one plaintext.
pub fn encode_slots(slots: &SlotNtt, values: &[u64]) -> Result<BfvPlaintext> {
    Ok(BfvPlaintext { coeffs: slots.encode(values)? })
}

pub fn decode_slots(slots: &SlotNtt, plaintext: &BfvPlaintext) -> Result<Vec<u64>> {
    slots.decode(&plaintext.coeffs)
}

/// Rotate each of the two rows left by `k` (right for negative `k`).
pub fn rotate_rows<T: Copy>(values: &[T], k: i64) -> Vec<T> {
    let row = values.len() / 2;
    if row == 0 {
        return values.to_vec();
    }
    let shift = k.rem_euclid(row as i64) as usize;
    let mut out = values.to_vec();
    out[..row].rotate_left(shift);
    out[row..].rotate_left(shift);
    out
}

/// Exchange the two rows.
pub fn swap_rows<T: Copy>(values: &[T]) -> Vec<T> {
    let row = values.len() / 2;
    values[row..].iter().chain(&values[..row]).copied().collect()
}

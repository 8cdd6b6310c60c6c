//! Coefficient-modulus budgets from the homomorphic encryption security standard.
//!
//! For ternary secrets and σ ≈ 3.2 the standard tabulates, per ring degree, the
//! largest log2(Q) that still meets each target level against classical and
//! quantum lattice reduction estimates. Parameter derivation in both backends
//! sizes its modulus chain against these numbers.

use crate::error::{HealError, Result};
use crate::params::Security;

/// Supported ring degrees, ascending.
pub const DEGREES: [usize; 6] = [1024, 2048, 4096, 8192, 16384, 32768];

/// Classical budgets, rows indexed like [`DEGREES`], columns 128/192/256.
const CLASSIC: [[u32; 3]; 6] = [
    [27, 19, 14],
    [54, 37, 29],
    [109, 75, 58],
    [218, 152, 118],
    [438, 305, 237],
    [881, 611, 476],
];

/// Post-quantum budgets, same layout.
const QUANTUM: [[u32; 3]; 6] = [
    [25, 17, 13],
    [51, 35, 27],
    [101, 70, 54],
    [202, 141, 109],
    [411, 284, 220],
    [827, 571, 443],
];

/// Largest total coefficient-modulus bit count allowed for `degree` at `security`.
pub fn max_coeff_modulus_bits(degree: usize, security: Security) -> Result<u32> {
    let row = DEGREES
        .iter()
        .position(|&d| d == degree)
        .ok_or(HealError::InvalidRingDegree(degree))?;
    let (table, col) = match security {
        Security::Classic128 => (&CLASSIC, 0),
        Security::Classic192 => (&CLASSIC, 1),
        Security::Classic256 => (&CLASSIC, 2),
        Security::Quantum128 => (&QUANTUM, 0),
        Security::Quantum192 => (&QUANTUM, 1),
        Security::Quantum256 => (&QUANTUM, 2),
    };
    Ok(table[row][col])
}

/// Check a proposed chain against the budget.
pub fn check_budget(degree: usize, security: Security, bit_sizes: &[u32]) -> Result<()> {
    let max_bits = max_coeff_modulus_bits(degree, security)?;
    let requested_bits: u32 = bit_sizes.iter().sum();
    if requested_bits > max_bits {
        return Err(HealError::SecurityUnsatisfiable {
            degree,
            security,
            requested_bits,
            max_bits,
        });
    }
    Ok(())
}

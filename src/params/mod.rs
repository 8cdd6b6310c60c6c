pub mod presets;
pub mod primes;
pub mod security;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HealError, Result};

/// Target security level from the homomorphic encryption standard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Security {
    #[default]
    Classic128,
    Classic192,
    Classic256,
    Quantum128,
    Quantum192,
    Quantum256,
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Security::Classic128 => "classic-128",
            Security::Classic192 => "classic-192",
            Security::Classic256 => "classic-256",
            Security::Quantum128 => "quantum-128",
            Security::Quantum192 => "quantum-192",
            Security::Quantum256 => "quantum-256",
        };
        f.write_str(name)
    }
}

/// Options for the exact-integer (BFV) backend.
///
/// A `plain_modulus` of 0 asks the backend to derive one from `plain_modulus_bits`;
/// after construction the backend reports the options it actually used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BfvOptions {
    pub security: Security,
    pub degree: usize,
    pub plain_modulus: u64,
    pub plain_modulus_bits: u32,
}

impl Default for BfvOptions {
    fn default() -> Self {
        Self {
            security: Security::Classic128,
            degree: 4096,
            plain_modulus: 0,
            plain_modulus_bits: 20,
        }
    }
}

impl BfvOptions {
    pub fn new(degree: usize) -> Self {
        Self { degree, ..Self::default() }
    }

    pub fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    pub fn plain_modulus(mut self, p: u64) -> Self {
        self.plain_modulus = p;
        self
    }

    pub fn plain_modulus_bits(mut self, bits: u32) -> Self {
        self.plain_modulus_bits = bits;
        self
    }

    /// Resolve the plain modulus and the modulus chain bit sizes.
    ///
    /// Returns the completed options (plain modulus filled in, bit count
    /// rewritten to match it) together with the chain, special prime last.
    pub(crate) fn resolve(&self) -> Result<(BfvOptions, Vec<u32>)> {
        validate_degree(self.degree)?;
        let plain_modulus = if self.plain_modulus == 0 {
            primes::find_plain_modulus(self.degree, self.plain_modulus_bits)?
        } else {
            let p = self.plain_modulus;
            if p % (2 * self.degree as u64) != 1 || !primes::is_prime(p) {
                return Err(HealError::PlainModulusNotBatching { modulus: p, degree: self.degree });
            }
            p
        };
        let max_bits = security::max_coeff_modulus_bits(self.degree, self.security)?;
        let chain = split_evenly(max_bits, max_bits.div_ceil(MAX_BFV_PRIME_BITS));
        security::check_budget(self.degree, self.security, &chain)?;

        // Δ = ⌊Q/p⌋ must leave room for noise at the lowest level.
        let data_bits: u32 = chain[..chain.len().saturating_sub(1).max(1)].iter().sum();
        if primes::bit_width(plain_modulus) + 8 > data_bits {
            return Err(HealError::InvalidParam(format!(
                "plain modulus {plain_modulus} leaves no noise room in a {data_bits}-bit modulus"
            )));
        }

        let resolved = BfvOptions {
            plain_modulus,
            plain_modulus_bits: primes::bit_width(plain_modulus),
            ..self.clone()
        };
        Ok((resolved, chain))
    }
}

impl fmt::Display for BfvOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BfvOptions{{degree={},plain_modulus={},plain_modulus_bits={}}}",
            self.degree, self.plain_modulus, self.plain_modulus_bits
        )
    }
}

/// Options for the approximate (CKKS) backend.
///
/// `levels` is the number of primes in the coefficient modulus, the last of
/// which is reserved for key switching, so `levels - 2` rescales are available.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CkksOptions {
    pub security: Security,
    pub degree: usize,
    pub levels: usize,
    pub default_scale: f64,
}

impl Default for CkksOptions {
    fn default() -> Self {
        Self {
            security: Security::Classic128,
            degree: 8192,
            levels: 4,
            default_scale: (1u64 << 40) as f64,
        }
    }
}

impl CkksOptions {
    pub fn new(degree: usize) -> Self {
        Self { degree, ..Self::default() }
    }

    pub fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    pub fn default_scale(mut self, scale: f64) -> Self {
        self.default_scale = scale;
        self
    }

    /// Bit sizes of the modulus chain, special prime last.
    ///
    /// Every intermediate prime matches the scale so a rescale returns the
    /// scale to roughly where it started; the outer primes absorb the spare budget.
    pub(crate) fn chain_bits(&self) -> Result<Vec<u32>> {
        validate_degree(self.degree)?;
        if self.levels < 2 {
            return Err(HealError::InvalidParam(format!(
                "CKKS needs at least 2 levels (data + special prime), got {}",
                self.levels
            )));
        }
        if !self.default_scale.is_finite() || self.default_scale < 2.0 {
            return Err(HealError::InvalidParam(format!(
                "default scale {} must be finite and at least 2",
                self.default_scale
            )));
        }
        let max_bits = security::max_coeff_modulus_bits(self.degree, self.security)? as i64;
        let bits_each = self.default_scale.log2().trunc() as i64;
        let bits_extra = (max_bits - self.levels as i64 * bits_each) / 2;
        let bits_special = (bits_each + bits_extra).min(60);
        if bits_each > 60 || bits_special < bits_each {
            return Err(HealError::SecurityUnsatisfiable {
                degree: self.degree,
                security: self.security,
                requested_bits: (self.levels as i64 * bits_each).max(0) as u32,
                max_bits: max_bits as u32,
            });
        }
        let mut bits = vec![bits_each as u32; self.levels];
        bits[0] = bits_special as u32;
        bits[self.levels - 1] = bits_special as u32;
        security::check_budget(self.degree, self.security, &bits)?;
        Ok(bits)
    }
}

impl fmt::Display for CkksOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CkksOptions{{degree={},levels={},default_scale={}}}",
            self.degree, self.levels, self.default_scale
        )
    }
}

/// Upper bound on a BFV chain prime; keeps the special prime above every data prime.
const MAX_BFV_PRIME_BITS: u32 = 49;

fn validate_degree(degree: usize) -> Result<()> {
    if !security::DEGREES.contains(&degree) {
        return Err(HealError::InvalidRingDegree(degree));
    }
    Ok(())
}

/// Split `total` bits into `count` nearly equal parts, larger parts last.
fn split_evenly(total: u32, count: u32) -> Vec<u32> {
    let count = count.max(1);
    let base = total / count;
    let extra = total % count;
    (0..count).map(|i| if i >= count - extra { base + 1 } else { base }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_evenly() {
        assert_eq!(split_evenly(109, 3), vec![36, 36, 37]);
        assert_eq!(split_evenly(218, 5), vec![43, 43, 44, 44, 44]);
        assert_eq!(split_evenly(438, 9), vec![48, 48, 48, 49, 49, 49, 49, 49, 49]);
        assert_eq!(split_evenly(27, 1), vec![27]);
    }

    #[test]
    fn test_bfv_resolve_derives_plain_modulus() {
        let (resolved, chain) = BfvOptions::new(4096).plain_modulus_bits(20).resolve().unwrap();
        assert_eq!(resolved.plain_modulus, 1032193);
        assert_eq!(resolved.plain_modulus_bits, 20);
        assert_eq!(chain, vec![36, 36, 37]);
    }

    #[test]
    fn test_bfv_resolve_rewrites_bits_for_explicit_modulus() {
        let (resolved, _) = BfvOptions::new(8192).plain_modulus(65537).resolve().unwrap();
        assert_eq!(resolved.plain_modulus_bits, 17);
    }

    #[test]
    fn test_bfv_rejects_non_batching_modulus() {
        assert!(BfvOptions::new(4096).plain_modulus(65537).resolve().is_ok());
        let err = BfvOptions::new(4096).plain_modulus(40961 * 3).resolve().unwrap_err();
        assert!(matches!(err, HealError::PlainModulusNotBatching { .. }));
        let err = BfvOptions::new(4096).plain_modulus(257).resolve().unwrap_err();
        assert!(matches!(err, HealError::PlainModulusNotBatching { modulus: 257, degree: 4096 }));
    }

    #[test]
    fn test_bfv_rejects_bad_degree() {
        assert!(matches!(
            BfvOptions::new(3000).resolve(),
            Err(HealError::InvalidRingDegree(3000))
        ));
    }

    #[test]
    fn test_ckks_chain_bits() {
        let opts = CkksOptions::new(8192).levels(4).default_scale(2f64.powi(40));
        assert_eq!(opts.chain_bits().unwrap(), vec![60, 40, 40, 60]);

        let opts = CkksOptions::new(4096).levels(3).default_scale(2f64.powi(30));
        assert_eq!(opts.chain_bits().unwrap(), vec![39, 30, 39]);
    }

    #[test]
    fn test_ckks_chain_over_budget() {
        let opts = CkksOptions::new(4096).levels(5).default_scale(2f64.powi(40));
        assert!(matches!(opts.chain_bits(), Err(HealError::SecurityUnsatisfiable { .. })));
    }

    #[test]
    fn test_ckks_needs_two_levels() {
        let opts = CkksOptions::new(8192).levels(1);
        assert!(matches!(opts.chain_bits(), Err(HealError::InvalidParam(_))));
    }

    #[test]
    fn test_display() {
        let bfv = BfvOptions { plain_modulus: 65537, plain_modulus_bits: 17, ..BfvOptions::new(8192) };
        assert_eq!(bfv.to_string(), "BfvOptions{degree=8192,plain_modulus=65537,plain_modulus_bits=17}");
        let ckks = CkksOptions::new(8192).levels(4).default_scale(1024.0);
        assert_eq!(ckks.to_string(), "CkksOptions{degree=8192,levels=4,default_scale=1024}");
    }
}

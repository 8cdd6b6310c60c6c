use crate::error::{HealError, Result};
use crate::ring::rns::{CrtTable, RnsPrime};

/// Ring degree, modulus chain and precomputed tables shared by both schemes.
///
/// The chain q_0..q_L carries ciphertexts; a ciphertext at level l lives modulo
/// Q_l = q_0···q_l. When the parameter set has more than one prime the last one
/// is split off as the key-switching special prime P and never carries data.
#[derive(Clone, Debug)]
pub struct RlweContext {
    pub degree: usize,
    pub chain: Vec<RnsPrime>,
    pub special: Option<RnsPrime>,
    crt: Vec<CrtTable>,
}

impl RlweContext {
    /// `primes` lists the whole parameter set; with `split_special` the last
    /// prime becomes P when at least two are present.
    pub fn new(degree: usize, primes: &[u64], split_special: bool) -> Result<Self> {
        if primes.is_empty() {
            return Err(HealError::InvalidParam("modulus chain must not be empty".into()));
        }
        let mut all = primes
            .iter()
            .map(|&q| RnsPrime::new(q, degree))
            .collect::<Result<Vec<_>>>()?;
        let special = if split_special && all.len() > 1 { all.pop() } else { None };
        let crt = (1..=all.len())
            .map(|len| {
                let moduli: Vec<u64> = all[..len].iter().map(RnsPrime::q).collect();
                CrtTable::new(&moduli)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { degree, chain: all, special, crt })
    }

    pub fn max_level(&self) -> usize {
        self.chain.len() - 1
    }

    /// Primes q_0..=q_level.
    pub fn primes_at(&self, level: usize) -> &[RnsPrime] {
        &self.chain[..=level.min(self.max_level())]
    }

    /// Primes q_0..=q_level followed by P; the basis key switching works in.
    pub fn key_basis(&self, level: usize) -> Result<Vec<RnsPrime>> {
        let special = self.special.as_ref().ok_or(HealError::KeySwitchUnavailable)?;
        let mut basis = self.primes_at(level).to_vec();
        basis.push(special.clone());
        Ok(basis)
    }

    /// The whole parameter set: chain primes then P, if present.
    pub fn all_primes(&self) -> Vec<RnsPrime> {
        self.chain.iter().chain(self.special.as_ref()).cloned().collect()
    }

    pub fn crt_at(&self, level: usize) -> &CrtTable {
        &self.crt[level.min(self.max_level())]
    }

    pub fn modulus_bits(&self, level: usize) -> u64 {
        self.crt_at(level).bits()
    }

    pub fn moduli(&self) -> Vec<u64> {
        self.chain.iter().map(RnsPrime::q).collect()
    }
}

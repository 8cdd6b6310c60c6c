use num_bigint::BigInt;
use tracing::debug;

use crate::error::{HealError, Result};
use crate::params::primes::{chain_from_bit_sizes, ntt_primes};
use crate::params::BfvOptions;
use crate::ring::modular::Modulus;
use crate::ring::rns::{bigint_mod, CrtTable, RnsPrime};
use crate::ring::slot_ntt::SlotNtt;
use crate::rlwe::RlweContext;

/// Size of the auxiliary primes used for exact tensor products.
const TENSOR_PRIME_BITS: u32 = 60;

/// Everything about a BFV parameter set that does not depend on keys.
#[derive(Clone, Debug)]
pub struct BfvContext {
    pub options: BfvOptions,
    pub rlwe: RlweContext,
    pub slots: SlotNtt,
    pub plain: Modulus,
    /// Residues of Δ_l = ⌊Q_l / p⌋ for each level l.
    delta: Vec<Vec<u64>>,
    /// Basis wide enough to hold a tensor product of two level-L ciphertexts exactly.
    pub tensor_primes: Vec<RnsPrime>,
    pub tensor_crt: CrtTable,
}

impl BfvContext {
    pub fn new(options: &BfvOptions) -> Result<Self> {
        let (options, bit_sizes) = options.resolve()?;
        let degree = options.degree;
        let p = options.plain_modulus;

        let primes = chain_from_bit_sizes(&bit_sizes, degree, &[p])?;
        let rlwe = RlweContext::new(degree, &primes, true)?;
        let slots = SlotNtt::new(degree, p)?;

        let delta = (0..=rlwe.max_level())
            .map(|level| {
                let crt = rlwe.crt_at(level);
                let d = BigInt::from(&crt.product / p);
                crt.moduli.iter().map(|&q| bigint_mod(&d, q)).collect()
            })
            .collect();

        // |c0·d1 + c1·d0| ≤ n·Q², kept below half the tensor modulus.
        let top_bits = rlwe.modulus_bits(rlwe.max_level());
        let needed = 2 * top_bits + u64::from(degree.trailing_zeros()) + 2;
        let count = needed.div_ceil(u64::from(TENSOR_PRIME_BITS - 1)) as usize;
        let mut exclude = primes.clone();
        exclude.push(p);
        let tensor_moduli = ntt_primes(TENSOR_PRIME_BITS, count, degree, &exclude)?;
        let tensor_primes = tensor_moduli
            .iter()
            .map(|&q| RnsPrime::new(q, degree))
            .collect::<Result<Vec<_>>>()?;
        let tensor_crt = CrtTable::new(&tensor_moduli)?;

        debug!(
            %options,
            chain = ?rlwe.moduli(),
            special = ?rlwe.special.as_ref().map(RnsPrime::q),
            tensor_primes = count,
            "bfv parameters"
        );

        Ok(Self { plain: Modulus::new(p), options, rlwe, slots, delta, tensor_primes, tensor_crt })
    }

    pub fn degree(&self) -> usize {
        self.options.degree
    }

    pub fn max_level(&self) -> usize {
        self.rlwe.max_level()
    }

    pub fn delta_at(&self, level: usize) -> Result<&[u64]> {
        self.delta
            .get(level)
            .map(Vec::as_slice)
            .ok_or(HealError::LevelMismatch { lhs: level, rhs: self.max_level() })
    }
}

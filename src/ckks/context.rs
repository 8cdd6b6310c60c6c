use tracing::debug;

use crate::ckks::encoding::CkksEncoder;
use crate::error::Result;
use crate::params::primes::chain_from_bit_sizes;
use crate::params::CkksOptions;
use crate::ring::rns::RnsPrime;
use crate::rlwe::RlweContext;

/// Key-independent state of a CKKS parameter set.
#[derive(Clone, Debug)]
pub struct CkksContext {
    pub options: CkksOptions,
    pub rlwe: RlweContext,
    pub encoder: CkksEncoder,
}

impl CkksContext {
    pub fn new(options: &CkksOptions) -> Result<Self> {
        let bits = options.chain_bits()?;
        let primes = chain_from_bit_sizes(&bits, options.degree, &[])?;
        let rlwe = RlweContext::new(options.degree, &primes, true)?;
        let encoder = CkksEncoder::new(options.degree)?;
        debug!(
            %options,
            chain_bits = ?bits,
            chain = ?rlwe.moduli(),
            special = ?rlwe.special.as_ref().map(RnsPrime::q),
            "ckks parameters"
        );
        Ok(Self { options: options.clone(), rlwe, encoder })
    }

    pub fn max_level(&self) -> usize {
        self.rlwe.max_level()
    }

    /// The prime a rescale at `level` divides by.
    pub fn prime_at(&self, level: usize) -> f64 {
        self.rlwe.chain[level.min(self.max_level())].q() as f64
    }
}

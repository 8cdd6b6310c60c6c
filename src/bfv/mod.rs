//! Exact-integer backend: n slots of Z_p arranged as two rows of n/2.

pub mod context;
pub mod encoding;
pub mod encrypt;
pub mod eval;
pub mod modswitch;

use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, instrument};

use crate::backend::{Backend, Maintenance, MaintenancePolicy, SumLayout};
use crate::error::{HealError, Result};
use crate::params::BfvOptions;
use crate::rlwe::keys::relinearization_key;
use crate::rlwe::{reflect, relinearize, rotate, Ciphertext, GaloisKeys, KeySwitchKey, PublicKey, SecretKey};

pub use context::BfvContext;
pub use encoding::BfvPlaintext;

/// Exact BFV-style backend owning its keys.
///
/// Relinearization and rotation keys exist only when the modulus chain has a
/// special prime; without one, those operations fail with
/// [`HealError::KeySwitchUnavailable`].
pub struct BfvBackend {
    ctx: BfvContext,
    sk: SecretKey,
    pk: PublicKey,
    relin: Option<KeySwitchKey>,
    galois: Option<GaloisKeys>,
    rng: Mutex<ChaCha20Rng>,
}

impl BfvBackend {
    /// Build parameters and keys, seeding the RNG from the OS.
    pub fn create(options: BfvOptions) -> Result<Self> {
        Self::create_with_rng(options, ChaCha20Rng::from_os_rng())
    }

    /// Build with an explicit RNG, which also drives every later encryption.
    #[instrument(skip_all, fields(degree = options.degree))]
    pub fn create_with_rng(options: BfvOptions, mut rng: ChaCha20Rng) -> Result<Self> {
        let ctx = BfvContext::new(&options)?;
        let sk = SecretKey::generate(&ctx.rlwe, &mut rng)?;
        let pk = PublicKey::generate(&ctx.rlwe, &sk, &mut rng)?;
        let (relin, galois) = if ctx.rlwe.special.is_some() {
            (
                Some(relinearization_key(&ctx.rlwe, &sk, &mut rng)?),
                Some(GaloisKeys::generate(&ctx.rlwe, &sk, &mut rng)?),
            )
        } else {
            (None, None)
        };
        debug!(options = %ctx.options, key_switching = relin.is_some(), "bfv backend ready");
        Ok(Self { ctx, sk, pk, relin, galois, rng: Mutex::new(rng) })
    }

    pub fn context(&self) -> &BfvContext {
        &self.ctx
    }

    pub fn plain_modulus(&self) -> u64 {
        self.ctx.plain.value
    }

    fn rng(&self) -> MutexGuard<'_, ChaCha20Rng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn galois_keys(&self) -> Result<&GaloisKeys> {
        self.galois.as_ref().ok_or(HealError::KeySwitchUnavailable)
    }
}

const AFTER_MULTIPLY: &[Maintenance] = &[Maintenance::Relinearize];

impl Backend for BfvBackend {
    type Scalar = u64;
    type Options = BfvOptions;
    type Plaintext = BfvPlaintext;
    type Ciphertext = Ciphertext;

    fn options(&self) -> &BfvOptions {
        &self.ctx.options
    }

    fn vector_size(&self) -> usize {
        self.ctx.degree()
    }

    fn maintenance_policy(&self) -> MaintenancePolicy {
        MaintenancePolicy { after_multiply: AFTER_MULTIPLY, after_multiply_plain: &[] }
    }

    fn sum_layout(&self) -> SumLayout {
        SumLayout { row: self.ctx.degree() / 2, fold_rows: true }
    }

    fn scalar_add(&self, a: u64, b: u64) -> u64 {
        self.ctx.plain.add(a % self.plain_modulus(), b % self.plain_modulus())
    }

    fn scalar_sub(&self, a: u64, b: u64) -> u64 {
        self.ctx.plain.sub(a % self.plain_modulus(), b % self.plain_modulus())
    }

    fn scalar_mul(&self, a: u64, b: u64) -> u64 {
        self.ctx.plain.mul(a % self.plain_modulus(), b % self.plain_modulus())
    }

    fn scalar_neg(&self, a: u64) -> u64 {
        self.ctx.plain.neg(a % self.plain_modulus())
    }

    /// Integer division of the extracted residues.
    fn scalar_div(&self, a: u64, b: u64) -> u64 {
        a.checked_div(b).unwrap_or(0)
    }

    fn scalar_is_zero(&self, a: u64) -> bool {
        a % self.plain_modulus() == 0
    }

    /// Integer arithmetic on the extracted residues; a negative result is
    /// returned as its residue mod p.
    fn clear_moment(&self, n: u64, sum_a: u64, sum_b: u64, sum_ab: u64) -> u64 {
        let (n, a, b, ab) = (n as i128, sum_a as i128, sum_b as i128, sum_ab as i128);
        let moment = match n {
            0 => 0,
            n => (ab - a * b / n) / n,
        };
        moment.rem_euclid(self.plain_modulus() as i128) as u64
    }

    fn rotate_slots(&self, values: &[u64], k: i64) -> Vec<u64> {
        encoding::rotate_rows(values, k)
    }

    fn flip_slots(&self, values: &[u64]) -> Vec<u64> {
        encoding::swap_rows(values)
    }

    fn encode_values(&self, values: &[u64]) -> Result<BfvPlaintext> {
        encoding::encode_slots(&self.ctx.slots, values)
    }

    fn decode_values(&self, plaintext: &BfvPlaintext) -> Result<Vec<u64>> {
        encoding::decode_slots(&self.ctx.slots, plaintext)
    }

    fn encrypt_plaintext(&self, plaintext: &BfvPlaintext) -> Result<Ciphertext> {
        encrypt::encrypt(&self.ctx, &self.pk, plaintext, &mut *self.rng())
    }

    fn decrypt_ciphertext(&self, ciphertext: &Ciphertext) -> Result<BfvPlaintext> {
        encrypt::decrypt(&self.ctx, &self.sk, ciphertext)
    }

    fn eval_add(&self, a: &mut Ciphertext, b: &Ciphertext) -> Result<()> {
        a.add_assign(b)
    }

    fn eval_add_plain(&self, a: &mut Ciphertext, b: &BfvPlaintext) -> Result<()> {
        eval::bfv_plain_add(&self.ctx, a, b)
    }

    fn eval_sub(&self, a: &mut Ciphertext, b: &Ciphertext) -> Result<()> {
        a.sub_assign(b)
    }

    fn eval_sub_plain(&self, a: &mut Ciphertext, b: &BfvPlaintext) -> Result<()> {
        eval::bfv_plain_sub(&self.ctx, a, b)
    }

    fn eval_multiply(&self, a: &mut Ciphertext, b: &Ciphertext) -> Result<()> {
        eval::bfv_mul(&self.ctx, a, b)
    }

    fn eval_multiply_plain(&self, a: &mut Ciphertext, b: &BfvPlaintext) -> Result<()> {
        eval::bfv_plain_mul(&self.ctx, a, b)
    }

    fn eval_negate(&self, a: &mut Ciphertext) -> Result<()> {
        a.neg_assign();
        Ok(())
    }

    fn eval_rotate(&self, a: &mut Ciphertext, k: i64) -> Result<()> {
        *a = rotate(&self.ctx.rlwe, self.galois_keys()?, a, k)?;
        Ok(())
    }

    fn eval_flip(&self, a: &mut Ciphertext) -> Result<()> {
        *a = reflect(&self.ctx.rlwe, self.galois_keys()?, a)?;
        Ok(())
    }

    fn eval_relinearize(&self, a: &mut Ciphertext) -> Result<()> {
        if a.degree() <= 1 {
            return Ok(());
        }
        let rlk = self.relin.as_ref().ok_or(HealError::KeySwitchUnavailable)?;
        *a = relinearize(&self.ctx.rlwe, a, rlk)?;
        Ok(())
    }

    fn eval_modulus_switch(&self, a: &mut Ciphertext) -> Result<()> {
        modswitch::mod_switch_drop_prime(a)
    }
}

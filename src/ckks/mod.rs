//! Approximate backend: n/2 complex slots carried at a tracked scale.

pub mod context;
pub mod encoding;
pub mod eval;

use std::sync::{Mutex, MutexGuard, PoisonError};

use num_bigint::BigInt;
use num_complex::Complex64;
use num_traits::ToPrimitive;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, instrument};

use crate::backend::{Backend, CiphertextInfo, Encoded, Encrypted, Maintenance, MaintenancePolicy, SumLayout, Vector};
use crate::error::{HealError, Result};
use crate::params::CkksOptions;
use crate::ring::rns::RnsPoly;
use crate::rlwe::keys::relinearization_key;
use crate::rlwe::{reflect, relinearize, rotate, Ciphertext, GaloisKeys, KeySwitchKey, PublicKey, SecretKey};

pub use context::CkksContext;
pub use encoding::CkksEncoder;

/// Slot magnitudes below this count as zero when an extracted count is tested.
const ZERO_THRESHOLD: f64 = 0.5;

/// Encoded polynomial ⌊Δ·m⌉ at some level of the chain.
#[derive(Clone, Debug)]
pub struct CkksPlaintext {
    pub poly: RnsPoly,
    pub scale: f64,
}

impl CkksPlaintext {
    pub fn level(&self) -> usize {
        self.poly.level()
    }
}

/// A ciphertext together with the scale of the message it carries.
#[derive(Clone, Debug)]
pub struct CkksCiphertext {
    pub inner: Ciphertext,
    pub scale: f64,
}

impl CiphertextInfo for CkksCiphertext {
    fn degree(&self) -> usize {
        self.inner.degree()
    }

    fn level(&self) -> usize {
        self.inner.level()
    }
}

/// Approximate CKKS-style backend owning its keys.
pub struct CkksBackend {
    ctx: CkksContext,
    sk: SecretKey,
    pk: PublicKey,
    relin: Option<KeySwitchKey>,
    galois: Option<GaloisKeys>,
    rng: Mutex<ChaCha20Rng>,
}

impl CkksBackend {
    pub fn create(options: CkksOptions) -> Result<Self> {
        Self::create_with_rng(options, ChaCha20Rng::from_os_rng())
    }

    #[instrument(skip_all, fields(degree = options.degree, levels = options.levels))]
    pub fn create_with_rng(options: CkksOptions, mut rng: ChaCha20Rng) -> Result<Self> {
        let ctx = CkksContext::new(&options)?;
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
        debug!(options = %ctx.options, key_switching = relin.is_some(), "ckks backend ready");
        Ok(Self { ctx, sk, pk, relin, galois, rng: Mutex::new(rng) })
    }

    pub fn context(&self) -> &CkksContext {
        &self.ctx
    }

    pub fn default_scale(&self) -> f64 {
        self.ctx.options.default_scale
    }

    /// Encode at an explicit scale and level, e.g. to meet a ciphertext
    /// that has already been rescaled.
    pub fn encode_values_at(&self, values: &[Complex64], scale: f64, level: usize) -> Result<CkksPlaintext> {
        if level > self.ctx.max_level() {
            return Err(HealError::InvalidParam(format!(
                "level {level} above the top of the chain ({})",
                self.ctx.max_level()
            )));
        }
        eval::check_scale_bound(&self.ctx, scale, level)?;
        let coeffs = self.ctx.encoder.encode(values, scale)?;
        let poly = RnsPoly::from_signed(&coeffs, self.ctx.rlwe.primes_at(level))?;
        Ok(CkksPlaintext { poly, scale })
    }

    /// [`CkksBackend::encode_values_at`] for a vector bound to this backend.
    pub fn encode_at<'b>(
        &'b self,
        vector: &Vector<'b, Self>,
        scale: f64,
        level: usize,
    ) -> Result<Encoded<'b, Self>> {
        self.check_owner(vector.backend())?;
        Ok(Encoded::from_parts(self, self.encode_values_at(vector.values(), scale, level)?))
    }

    /// Divide by the last prime of the chain, bringing the scale back down.
    pub fn modulus_rescale<'v, 'b>(&self, a: &'v mut Encrypted<'b, Self>) -> Result<&'v mut Encrypted<'b, Self>> {
        self.check_owner(a.backend())?;
        self.eval_rescale(a.ciphertext_mut())?;
        Ok(a)
    }

    fn rng(&self) -> MutexGuard<'_, ChaCha20Rng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn galois_keys(&self) -> Result<&GaloisKeys> {
        self.galois.as_ref().ok_or(HealError::KeySwitchUnavailable)
    }

    fn decode_poly(&self, poly: &RnsPoly, scale: f64) -> Result<Vec<Complex64>> {
        let crt = self.ctx.rlwe.crt_at(poly.level());
        let coeffs = poly
            .to_bigint_centered(crt)?
            .iter()
            .map(|c: &BigInt| c.to_f64().unwrap_or(f64::NAN))
            .collect::<Vec<_>>();
        self.ctx.encoder.decode(&coeffs, scale)
    }
}

const AFTER_MULTIPLY: &[Maintenance] = &[Maintenance::Relinearize, Maintenance::Rescale];
const AFTER_MULTIPLY_PLAIN: &[Maintenance] = &[Maintenance::Rescale];

impl Backend for CkksBackend {
    type Scalar = Complex64;
    type Options = CkksOptions;
    type Plaintext = CkksPlaintext;
    type Ciphertext = CkksCiphertext;

    fn options(&self) -> &CkksOptions {
        &self.ctx.options
    }

    fn vector_size(&self) -> usize {
        self.ctx.encoder.slots()
    }

    fn maintenance_policy(&self) -> MaintenancePolicy {
        MaintenancePolicy { after_multiply: AFTER_MULTIPLY, after_multiply_plain: AFTER_MULTIPLY_PLAIN }
    }

    fn sum_layout(&self) -> SumLayout {
        SumLayout { row: self.ctx.encoder.slots(), fold_rows: false }
    }

    fn scalar_add(&self, a: Complex64, b: Complex64) -> Complex64 {
        a + b
    }

    fn scalar_sub(&self, a: Complex64, b: Complex64) -> Complex64 {
        a - b
    }

    fn scalar_mul(&self, a: Complex64, b: Complex64) -> Complex64 {
        a * b
    }

    fn scalar_neg(&self, a: Complex64) -> Complex64 {
        -a
    }

    fn scalar_div(&self, a: Complex64, b: Complex64) -> Complex64 {
        a / b
    }

    fn scalar_is_zero(&self, a: Complex64) -> bool {
        a.norm() < ZERO_THRESHOLD
    }

    fn rotate_slots(&self, values: &[Complex64], k: i64) -> Vec<Complex64> {
        let mut out = values.to_vec();
        if !out.is_empty() {
            let shift = k.rem_euclid(out.len() as i64) as usize;
            out.rotate_left(shift);
        }
        out
    }

    fn flip_slots(&self, values: &[Complex64]) -> Vec<Complex64> {
        values.iter().map(Complex64::conj).collect()
    }

    fn encode_values(&self, values: &[Complex64]) -> Result<CkksPlaintext> {
        self.encode_values_at(values, self.default_scale(), self.ctx.max_level())
    }

    fn decode_values(&self, plaintext: &CkksPlaintext) -> Result<Vec<Complex64>> {
        self.decode_poly(&plaintext.poly, plaintext.scale)
    }

    /// Encrypts at the top of the chain, then truncates to the plaintext's level.
    fn encrypt_plaintext(&self, plaintext: &CkksPlaintext) -> Result<CkksCiphertext> {
        let top = self.ctx.max_level();
        let message = if plaintext.level() == top {
            plaintext.poly.clone()
        } else {
            let crt = self.ctx.rlwe.crt_at(plaintext.level());
            RnsPoly::from_bigint(&plaintext.poly.to_bigint_centered(crt)?, self.ctx.rlwe.primes_at(top))?
        };
        let mut inner = self.pk.encrypt(&self.ctx.rlwe, &message, &mut *self.rng())?;
        if plaintext.level() < top {
            inner = inner.map_parts(|part| Ok(part.prefix(plaintext.level())))?;
        }
        Ok(CkksCiphertext { inner, scale: plaintext.scale })
    }

    fn decrypt_ciphertext(&self, ciphertext: &CkksCiphertext) -> Result<CkksPlaintext> {
        let poly = self.sk.phase(&ciphertext.inner)?;
        Ok(CkksPlaintext { poly, scale: ciphertext.scale })
    }

    fn eval_add(&self, a: &mut CkksCiphertext, b: &CkksCiphertext) -> Result<()> {
        eval::ckks_add(a, b)
    }

    fn eval_add_plain(&self, a: &mut CkksCiphertext, b: &CkksPlaintext) -> Result<()> {
        eval::ckks_plain_add(a, b)
    }

    fn eval_sub(&self, a: &mut CkksCiphertext, b: &CkksCiphertext) -> Result<()> {
        eval::ckks_sub(a, b)
    }

    fn eval_sub_plain(&self, a: &mut CkksCiphertext, b: &CkksPlaintext) -> Result<()> {
        eval::ckks_plain_sub(a, b)
    }

    fn eval_multiply(&self, a: &mut CkksCiphertext, b: &CkksCiphertext) -> Result<()> {
        eval::ckks_mul(&self.ctx, a, b)
    }

    fn eval_multiply_plain(&self, a: &mut CkksCiphertext, b: &CkksPlaintext) -> Result<()> {
        eval::ckks_plain_mul(&self.ctx, a, b)
    }

    fn eval_negate(&self, a: &mut CkksCiphertext) -> Result<()> {
        a.inner.neg_assign();
        Ok(())
    }

    fn eval_rotate(&self, a: &mut CkksCiphertext, k: i64) -> Result<()> {
        a.inner = rotate(&self.ctx.rlwe, self.galois_keys()?, &a.inner, k)?;
        Ok(())
    }

    /// Complex conjugation of every slot.
    fn eval_flip(&self, a: &mut CkksCiphertext) -> Result<()> {
        a.inner = reflect(&self.ctx.rlwe, self.galois_keys()?, &a.inner)?;
        Ok(())
    }

    fn eval_relinearize(&self, a: &mut CkksCiphertext) -> Result<()> {
        if a.inner.degree() <= 1 {
            return Ok(());
        }
        let rlk = self.relin.as_ref().ok_or(HealError::KeySwitchUnavailable)?;
        a.inner = relinearize(&self.ctx.rlwe, &a.inner, rlk)?;
        Ok(())
    }

    fn eval_modulus_switch(&self, a: &mut CkksCiphertext) -> Result<()> {
        eval::ckks_mod_switch(a)
    }

    fn eval_rescale(&self, a: &mut CkksCiphertext) -> Result<()> {
        eval::ckks_rescale(&self.ctx, a)
    }
}

impl<'b> Encrypted<'b, CkksBackend> {
    pub fn scale(&self) -> f64 {
        self.ciphertext().scale
    }

    /// Overwrite the tracked scale without touching the ciphertext.
    ///
    /// Useful to line up two operands whose scales differ only by the drift
    /// rescaling introduces.
    pub fn assume_scale(&mut self, scale: f64) -> Result<()> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(HealError::InvalidParam(format!("scale must be positive and finite, got {scale}")));
        }
        self.ciphertext_mut().scale = scale;
        Ok(())
    }

    pub fn modulus_rescale(&mut self) -> Result<&mut Self> {
        let backend = self.backend();
        backend.modulus_rescale(self)
    }

    /// New ciphertext with every slot conjugated.
    pub fn conjugate(&self) -> Result<Self> {
        self.try_flip()
    }
}

impl<'b> Encoded<'b, CkksBackend> {
    pub fn scale(&self) -> f64 {
        self.plaintext().scale
    }

    pub fn level(&self) -> usize {
        self.plaintext().level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::presets;
    use std::sync::OnceLock;

    fn backend() -> &'static CkksBackend {
        static BACKEND: OnceLock<CkksBackend> = OnceLock::new();
        BACKEND.get_or_init(|| CkksBackend::create_with_rng(presets::ckks_4096(), ChaCha20Rng::seed_from_u64(11)).unwrap())
    }

    fn wave(b: &CkksBackend) -> Vec<Complex64> {
        (0..b.vector_size())
            .map(|i| Complex64::new((i % 17) as f64 * 0.25 - 2.0, (i % 5) as f64 * 0.5))
            .collect()
    }

    fn assert_close(got: &[Complex64], expected: &[Complex64], tol: f64) {
        assert_eq!(got.len(), expected.len());
        for (i, (g, e)) in got.iter().zip(expected).enumerate() {
            assert!((g - e).norm() < tol, "slot {i}: got {g}, expected {e}");
        }
    }

    fn roundtrip(b: &CkksBackend, ct: &CkksCiphertext) -> Vec<Complex64> {
        b.decode_values(&b.decrypt_ciphertext(ct).unwrap()).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let b = backend();
        let x = wave(b);
        let ct = b.encrypt_plaintext(&b.encode_values(&x).unwrap()).unwrap();
        assert_eq!(ct.level(), 1);
        assert_close(&roundtrip(b, &ct), &x, 1e-3);
    }

    #[test]
    fn test_multiply_relinearize_rescale() {
        let b = backend();
        let x = wave(b);
        let mut ct = b.encrypt_plaintext(&b.encode_values(&x).unwrap()).unwrap();
        let other = ct.clone();
        b.eval_multiply(&mut ct, &other).unwrap();
        assert_eq!(ct.degree(), 2);
        b.eval_relinearize(&mut ct).unwrap();
        b.eval_rescale(&mut ct).unwrap();
        assert_eq!(ct.level(), 0);

        let expected: Vec<Complex64> = x.iter().map(|v| v * v).collect();
        assert_close(&roundtrip(b, &ct), &expected, 1e-2);
        assert!(matches!(b.eval_rescale(&mut ct), Err(HealError::ModulusChainExhausted)));
    }

    #[test]
    fn test_add_rejects_scale_mismatch() {
        let b = backend();
        let x = wave(b);
        let mut ct = b.encrypt_plaintext(&b.encode_values(&x).unwrap()).unwrap();
        let doubled = b.encrypt_plaintext(&b.encode_values_at(&x, 2.0 * b.default_scale(), 1).unwrap()).unwrap();
        assert!(matches!(b.eval_add(&mut ct, &doubled), Err(HealError::ScaleMismatch { .. })));
    }

    #[test]
    fn test_scale_out_of_bounds() {
        let b = backend();
        let x = wave(b);
        assert!(matches!(
            b.encode_values_at(&x, 2f64.powi(45), 0),
            Err(HealError::ScaleOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_encrypt_below_top_level() {
        let b = backend();
        let x = wave(b);
        let pt = b.encode_values_at(&x, b.default_scale(), 0).unwrap();
        let ct = b.encrypt_plaintext(&pt).unwrap();
        assert_eq!(ct.level(), 0);
        assert_close(&roundtrip(b, &ct), &x, 1e-3);
    }

    #[test]
    fn test_rotate_and_conjugate() {
        let b = backend();
        let x = wave(b);
        let mut ct = b.encrypt_plaintext(&b.encode_values(&x).unwrap()).unwrap();
        b.eval_rotate(&mut ct, -5).unwrap();
        assert_close(&roundtrip(b, &ct), &b.rotate_slots(&x, -5), 1e-3);
        b.eval_flip(&mut ct).unwrap();
        assert_close(&roundtrip(b, &ct), &b.flip_slots(&b.rotate_slots(&x, -5)), 1e-3);
    }

    #[test]
    fn test_modulus_switch_keeps_scale() {
        let b = backend();
        let x = wave(b);
        let mut ct = b.encrypt_plaintext(&b.encode_values(&x).unwrap()).unwrap();
        let scale = ct.scale;
        b.eval_modulus_switch(&mut ct).unwrap();
        assert_eq!(ct.level(), 0);
        assert_eq!(ct.scale, scale);
        assert_close(&roundtrip(b, &ct), &x, 1e-3);
        assert!(matches!(b.eval_modulus_switch(&mut ct), Err(HealError::ModulusChainExhausted)));
    }
}

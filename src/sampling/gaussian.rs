use rand::Rng;

/// Standard deviation of the encryption and key noise.
pub const NOISE_SIGMA: f64 = 3.2;

/// Sample `n` small signed coefficients from a discrete Gaussian centered at 0.
///
/// The coefficients are returned as integers so the caller can lift the same
/// noise into every prime of an RNS basis.
pub fn sample_gaussian<R: Rng + ?Sized>(n: usize, sigma: f64, rng: &mut R) -> Vec<i128> {
    let table = CdtTable::new(sigma);
    (0..n).map(|_| table.sample(rng) as i128).collect()
}

/// Cumulative distribution table over [-6σ, 6σ].
struct CdtTable {
    tail: i64,
    cdf: Vec<f64>,
}

impl CdtTable {
    fn new(sigma: f64) -> Self {
        let tail = (6.0 * sigma).ceil() as i64;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut cumulative = 0.0f64;
        let cdf = (-tail..=tail)
            .map(|x| {
                cumulative += (-((x * x) as f64) / two_sigma_sq).exp();
                cumulative
            })
            .collect();
        Self { tail, cdf }
    }

    /// Constant-time scan: every entry is visited and the lowest index with
    /// u < cdf[i] is selected through integer masks.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let total = self.cdf.last().copied().unwrap_or(1.0);
        let u: f64 = rng.random::<f64>() * total;

        let mut result = self.tail;
        for (i, &c) in self.cdf.iter().enumerate().rev() {
            let mask = ((u < c) as i64).wrapping_neg();
            let candidate = -self.tail + i as i64;
            result = (candidate & mask) | (result & !mask);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_gaussian_distribution() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let n = 10000;
        let samples = sample_gaussian(n, NOISE_SIGMA, &mut rng);

        let mean: f64 = samples.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.5, "mean = {mean}");

        let var: f64 = samples.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n as f64;
        let expected_var = NOISE_SIGMA * NOISE_SIGMA;
        assert!((var - expected_var).abs() < 2.0, "var = {var}, expected ≈ {expected_var}");

        let tail = (6.0 * NOISE_SIGMA).ceil() as i128;
        assert!(samples.iter().all(|s| s.abs() <= tail));
    }

    #[test]
    fn test_same_seed_same_noise() {
        let a = sample_gaussian(64, NOISE_SIGMA, &mut ChaCha20Rng::seed_from_u64(7));
        let b = sample_gaussian(64, NOISE_SIGMA, &mut ChaCha20Rng::seed_from_u64(7));
        assert_eq!(a, b);
    }
}

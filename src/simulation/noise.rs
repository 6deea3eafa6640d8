use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub impulse: Option<ImpulseNoiseConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_gaussian(mut self, std_dev: f64) -> Self {
        self.additive = Some(AdditiveNoiseConfig { std_dev });
        self
    }

    pub fn with_impulse(mut self, probability: f64, amplitude: f64) -> Self {
        self.impulse = Some(ImpulseNoiseConfig {
            probability,
            amplitude,
        });
        self
    }
}

/// Gaussian noise with a fixed standard deviation in signal units
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub std_dev: f64,
}

/// Single-sample spikes of random sign
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ImpulseNoiseConfig {
    /// Chance that any given sample is hit
    pub probability: f64,
    pub amplitude: f64,
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

fn apply_additive_noise(signal: &mut [f64], config: &AdditiveNoiseConfig, rng: &mut ChaCha8Rng) {
    let Ok(normal) = Normal::new(0.0, config.std_dev) else {
        log::warn!("Invalid noise standard deviation {}", config.std_dev);
        return;
    };
    if config.std_dev == 0.0 {
        return;
    }

    for sample in signal.iter_mut() {
        *sample += normal.sample(rng);
    }
}

fn apply_impulse_noise(signal: &mut [f64], config: &ImpulseNoiseConfig, rng: &mut ChaCha8Rng) {
    if config.probability <= 0.0 {
        return;
    }

    for sample in signal.iter_mut() {
        if rng.random::<f64>() < config.probability {
            let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
            *sample += sign * config.amplitude;
        }
    }
}

/// Add the configured noise to `signal` in place
pub fn apply_noise(signal: &mut [f64], config: &NoiseConfig) {
    let mut rng = create_rng(config.seed);

    if let Some(ref additive_config) = config.additive {
        apply_additive_noise(signal, additive_config, &mut rng);
    }

    if let Some(ref impulse_config) = config.impulse {
        apply_impulse_noise(signal, impulse_config, &mut rng);
    }
}

/// Saturate `signal` at `level`, returning how many samples were clipped
pub fn clip(signal: &mut [f64], level: f64) -> usize {
    let mut clipped = 0;
    for sample in signal.iter_mut().filter(|s| **s > level) {
        *sample = level;
        clipped += 1;
    }
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<f64> {
        (0..1000).map(|i| (i as f64 * 0.1).sin()).collect()
    }

    #[test]
    fn test_additive_noise_changes_signal() {
        let clean = ramp();
        let mut noisy = clean.clone();
        apply_noise(&mut noisy, &NoiseConfig::default().with_seed(42).with_gaussian(0.1));

        assert_eq!(clean.len(), noisy.len());
        assert_ne!(clean, noisy);
    }

    #[test]
    fn test_seeded_rng_reproducibility() {
        let config = NoiseConfig::default().with_seed(12345).with_gaussian(0.05);
        let mut noisy1 = ramp();
        let mut noisy2 = ramp();
        apply_noise(&mut noisy1, &config);
        apply_noise(&mut noisy2, &config);

        assert_eq!(noisy1, noisy2);
    }

    #[test]
    fn test_noise_level_matches_std_dev() {
        let mut signal = vec![0.0; 20_000];
        apply_noise(&mut signal, &NoiseConfig::default().with_seed(7).with_gaussian(0.5));
        let variance = signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64;
        assert!((variance.sqrt() - 0.5).abs() < 0.02, "std {}", variance.sqrt());
    }

    #[test]
    fn test_impulse_noise_adds_spikes() {
        let mut signal = vec![0.0; 1000];
        apply_noise(&mut signal, &NoiseConfig::default().with_seed(42).with_impulse(0.05, 3.0));

        let spikes = signal.iter().filter(|&&x| x.abs() == 3.0).count();
        assert!(spikes > 20 && spikes < 90, "spikes {}", spikes);
        assert!(signal.iter().all(|&x| x == 0.0 || x.abs() == 3.0));
    }

    #[test]
    fn test_invalid_std_dev_is_ignored() {
        let mut signal = vec![1.0; 10];
        apply_noise(&mut signal, &NoiseConfig::default().with_seed(1).with_gaussian(-1.0));
        assert_eq!(signal, vec![1.0; 10]);
    }

    #[test]
    fn test_clip() {
        let mut signal = vec![1.0, 5.0, 9.0, 10.0, 7.0];
        assert_eq!(clip(&mut signal, 8.0), 2);
        assert_eq!(signal, vec![1.0, 5.0, 8.0, 8.0, 7.0]);
        assert_eq!(clip(&mut signal, 20.0), 0);
    }
}

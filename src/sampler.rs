//! Crash-point sampling.
//!
//! One draw per round from an injected random source. The distribution is a
//! display algorithm, not a fairness commitment: a fixed instant-bust floor,
//! then an inverse-transform heavy tail that concentrates outcomes low while
//! allowing rare large multipliers, clamped to a hard cap.

use crate::config::SamplerConfig;
use crate::round::Multiplier;
use rand::Rng;

/// Produces one round's crash multiplier.
pub struct CrashPointSampler {
    config: SamplerConfig,
}

impl CrashPointSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Draw a crash point. Must be invoked exactly once per round.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Multiplier {
        // Instant-bust floor: the round ends at 1.00x before anyone wins.
        if rng.gen::<f64>() < self.config.instant_bust_probability {
            return Multiplier::ONE;
        }

        // Inverse transform of an exponential-like curve: most mass just
        // above 1x, a long right tail.
        let u: f64 = rng.gen();
        let r = 1.0 / (1.0 - u);
        let clamped = r.clamp(self.config.min_crash, self.config.max_crash);
        Multiplier::from_f64(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SAMPLES: usize = 10_000;

    #[test]
    fn samples_stay_within_bounds() {
        let sampler = CrashPointSampler::new(SamplerConfig::default());
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..SAMPLES {
            let crash = sampler.sample(&mut rng);
            assert!(crash >= Multiplier::ONE);
            assert!(crash <= Multiplier::from_hundredths(20_000));
        }
    }

    #[test]
    fn instant_bust_frequency_is_about_one_percent() {
        let sampler = CrashPointSampler::new(SamplerConfig::default());
        let mut rng = StdRng::seed_from_u64(42);

        let busts = (0..SAMPLES)
            .filter(|_| sampler.sample(&mut rng) == Multiplier::ONE)
            .count();

        // 1% of 10k draws, with slack for sampling noise.
        assert!((50..=160).contains(&busts), "bust count {busts} out of band");
    }

    #[test]
    fn non_bust_samples_are_at_least_one_point_oh_one() {
        let sampler = CrashPointSampler::new(SamplerConfig::default());
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..SAMPLES {
            let crash = sampler.sample(&mut rng);
            if crash != Multiplier::ONE {
                assert!(crash >= Multiplier::from_hundredths(101));
            }
        }
    }

    #[test]
    fn distribution_skews_low_with_a_long_tail() {
        let sampler = CrashPointSampler::new(SamplerConfig::default());
        let mut rng = StdRng::seed_from_u64(1);

        let below_3x = (0..SAMPLES)
            .filter(|_| sampler.sample(&mut rng) < Multiplier::from_hundredths(300))
            .count();

        // 1 - 1/3 of the inverse-transform mass sits below 3x.
        assert!(below_3x > SAMPLES / 2, "only {below_3x} draws below 3x");
    }

    #[test]
    fn bust_probability_one_always_returns_the_floor() {
        let sampler = CrashPointSampler::new(SamplerConfig {
            instant_bust_probability: 1.0,
            ..SamplerConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            assert_eq!(sampler.sample(&mut rng), Multiplier::ONE);
        }
    }

    #[test]
    fn pinned_clamp_pins_the_crash_point() {
        let sampler = CrashPointSampler::new(SamplerConfig {
            instant_bust_probability: 0.0,
            min_crash: 2.5,
            max_crash: 2.5,
        });
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            assert_eq!(sampler.sample(&mut rng), Multiplier::from_hundredths(250));
        }
    }
}

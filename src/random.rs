//! Randomized values within configured bounds.
//!
//! Everything random in the automation (wait intervals, gesture shape, gesture
//! duration) is drawn through [`RandomSource`], so the controller never touches an
//! ambient global RNG and tests can inject a seeded or scripted source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniformly distributed values within inclusive bounds.
///
/// Passing `min > max` is a programmer error and panics: configuration is validated
/// before any value is drawn.
pub trait RandomSource: Send {
    /// Uniform integer in `[min, max]`.
    fn uniform_int(&mut self, min: i64, max: i64) -> i64;

    /// Uniform float in `[min, max]`.
    fn uniform_float(&mut self, min: f64, max: f64) -> f64;
}

/// [`RandomSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomRangeProvider<R = StdRng> {
    rng: R,
}

impl RandomRangeProvider<StdRng> {
    /// Provider seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic provider, useful for reproducible runs and tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomRangeProvider<R> {
    /// Wrap an existing generator.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> RandomSource for RandomRangeProvider<R> {
    fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "uniform_int called with min {min} > max {max}");
        if min == max {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    fn uniform_float(&mut self, min: f64, max: f64) -> f64 {
        assert!(min <= max, "uniform_float called with min {min} > max {max}");
        if min == max {
            return min;
        }
        self.rng.random_range(min..=max)
    }
}

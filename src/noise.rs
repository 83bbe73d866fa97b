//! Observation noise
//!
//! Synthetic noisy acceleration: `acc + scale * |acc| * N(0, 1)`.
//! The standard normal source is a caller-supplied dependency so runs can be
//! reproduced exactly or made noise-free.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::RsfError;

/// Seed used when the caller does not supply a generator
pub const DEFAULT_NOISE_SEED: u64 = 0x5EED_0FF4_1C00;

/// Source of standard normal samples
pub trait NoiseSource {
    fn standard_normal(&mut self) -> f64;
}

impl<T: NoiseSource + ?Sized> NoiseSource for &mut T {
    fn standard_normal(&mut self) -> f64 {
        (**self).standard_normal()
    }
}

impl<T: NoiseSource + ?Sized> NoiseSource for Box<T> {
    fn standard_normal(&mut self) -> f64 {
        (**self).standard_normal()
    }
}

/// Gaussian samples drawn from any `rand` generator
#[derive(Debug, Clone)]
pub struct GaussianNoise<R = ChaCha8Rng> {
    rng: R,
}

impl<R: Rng> GaussianNoise<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl GaussianNoise<ChaCha8Rng> {
    /// Deterministic generator for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Fresh, non-reproducible generator seeded from the operating system.
    ///
    /// # Errors
    /// [`RsfError::InvalidConfig`] if the OS entropy source is unavailable.
    pub fn from_os_entropy() -> Result<Self, RsfError> {
        let rng = ChaCha8Rng::from_rng(rand::rngs::OsRng).map_err(|err| {
            RsfError::InvalidConfig(format!("cannot seed noise generator: {err}"))
        })?;
        Ok(Self::from_rng(rng))
    }
}

impl Default for GaussianNoise<ChaCha8Rng> {
    fn default() -> Self {
        Self::seeded(DEFAULT_NOISE_SEED)
    }
}

impl<R: Rng> NoiseSource for GaussianNoise<R> {
    fn standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}

/// Noise-free source; every sample is 0
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn standard_normal(&mut self) -> f64 {
        0.0
    }
}

/// Multiplicative noise applied to the true acceleration
#[derive(Debug, Clone)]
pub struct NoiseInjector<S> {
    source: S,
    scale: f64,
}

impl<S: NoiseSource> NoiseInjector<S> {
    /// Injector with unit relative noise
    pub fn new(source: S) -> Self {
        Self { source, scale: 1.0 }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Noisy observation of `acc`
    pub fn apply(&mut self, acc: f64) -> f64 {
        acc + self.scale * acc.abs() * self.source.standard_normal()
    }
}

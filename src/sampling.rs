//! Variable sampler: noisy draws around scenario means, clamped to declared bounds.
//!
//! The random primitive sits behind [`NoiseSource`]. The orchestrator asks a
//! [`SamplerFactory`] for one source per trial, so trials never share RNG state
//! and a run is reproducible regardless of how rayon schedules them.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::TrialError;
use crate::types::{PlayerTag, VariableDefinition};

/// Draws `count` values from a distribution with the given mean and stdev.
pub trait NoiseSource {
    fn sample_from_distribution(&mut self, mean: f64, stdev: f64, count: usize) -> Vec<f64>;
}

/// Builds an independent [`NoiseSource`] for each trial.
pub trait SamplerFactory: Sync {
    type Source: NoiseSource;

    fn for_trial(&self, trial: usize) -> Self::Source;
}

/// Normal noise from a seeded `SmallRng`.
pub struct NormalNoise {
    rng: SmallRng,
}

impl NormalNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl NoiseSource for NormalNoise {
    /// Returns an empty sequence if `(mean, stdev)` does not describe a valid
    /// normal distribution.
    fn sample_from_distribution(&mut self, mean: f64, stdev: f64, count: usize) -> Vec<f64> {
        match Normal::new(mean, stdev) {
            Ok(dist) => (0..count).map(|_| dist.sample(&mut self.rng)).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Per-trial [`NormalNoise`] seeded with `seed + trial`.
#[derive(Clone, Copy, Debug)]
pub struct SeededNormal {
    pub seed: u64,
}

impl SeededNormal {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl SamplerFactory for SeededNormal {
    type Source = NormalNoise;

    fn for_trial(&self, trial: usize) -> NormalNoise {
        NormalNoise::new(self.seed.wrapping_add(trial as u64))
    }
}

/// `max(lo, min(hi, x))`. Never panics, unlike `f64::clamp`, when `lo > hi`.
#[inline]
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(x))
}

/// Draw one value for `def` around `mean`, clamping to `[min, max]` if requested.
pub fn sample_variable<S: NoiseSource>(
    source: &mut S,
    def: &VariableDefinition,
    mean: f64,
    player: PlayerTag,
    clamp_to_bounds: bool,
) -> Result<f64, TrialError> {
    let draws = source.sample_from_distribution(mean, def.stdev, 1);
    let value = match draws.first() {
        Some(&v) if v.is_finite() => v,
        Some(&v) => {
            return Err(TrialError::Sampling {
                variable: format!("{}_{}", def.id, player),
                message: format!("non-finite draw {}", v),
            })
        }
        None => {
            return Err(TrialError::Sampling {
                variable: format!("{}_{}", def.id, player),
                message: format!("no value drawn for mean={} stdev={}", mean, def.stdev),
            })
        }
    };
    Ok(if clamp_to_bounds {
        clamp(value, def.min, def.max)
    } else {
        value
    })
}

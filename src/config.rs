//! Run configuration passed explicitly into the orchestrator.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SEED, DEFAULT_TRIALS};
use crate::formula::EvalOptions;

/// Where values are clamped on their way into a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplingPolicy {
    /// Clamp each sampled value to its variable's `[min, max]`.
    pub clamp_samples: bool,
    /// Clamp standardized (`_stnd`) values to `[0, 1]`.
    pub clamp_standardized: bool,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            clamp_samples: true,
            clamp_standardized: true,
        }
    }
}

impl SamplingPolicy {
    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            clamp_standardized: self.clamp_standardized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    pub trials: usize,
    pub seed: u64,
    /// Run trials on the rayon pool.
    pub parallel: bool,
    pub sampling: SamplingPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: DEFAULT_SEED,
            parallel: true,
            sampling: SamplingPolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

//! Simulation orchestrator: plays N independent trials of the tariff game.
//!
//! Each trial sweeps the four scenarios: sample both players' variables around
//! that scenario's means, evaluate both formulas, then hand the ordered payoff
//! list to the equilibrium solver.
//!
//! ## Failure isolation
//!
//! A trial yields a [`TrialOutcome`]: either a full [`TrialRecord`] or a
//! classified [`TrialFailure`]. Nothing from a failed trial is kept except its
//! diagnostic. Structural problems with the player specs are caught once, up
//! front, and fail the run with a [`SimulationError`]. A formula that cannot be
//! parsed or names an undeclared variable is not structural: each trial records
//! it as a classified failure.
//!
//! ## Parallelism
//!
//! Trials share only read-only inputs. With `config.parallel` they run on the
//! rayon pool; `collect()` keeps trial order, and every trial gets its own noise
//! source from the [`SamplerFactory`], so output does not depend on scheduling.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{SamplingPolicy, SimulationConfig};
use crate::constants::SCENARIO_COUNT;
use crate::error::{FormulaError, SimulationError, SolverError, TrialError};
use crate::formula::Formula;
use crate::game::{BackwardInduction, Equilibrium, EquilibriumSolver};
use crate::sampling::{sample_variable, NoiseSource, SamplerFactory, SeededNormal};
use crate::types::{
    outcome_list, PayoffPair, PlayerSpec, PlayerTag, SampledValues, Scenario, ScenarioPayoffs,
    ScenarioRows,
};

// ── Records ─────────────────────────────────────────────────────────

/// Sampled values for one scenario, in each player's variable order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSamples {
    pub player_a: Vec<f64>,
    pub player_b: Vec<f64>,
}

/// One completed trial.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub trial: usize,
    pub payoffs: ScenarioPayoffs,
    pub samples: BTreeMap<Scenario, ScenarioSamples>,
    pub equilibrium: Equilibrium,
}

/// Diagnostic for a trial that did not complete.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialFailure {
    pub trial: usize,
    pub kind: String,
    pub message: String,
}

impl TrialFailure {
    pub fn new(trial: usize, err: &TrialError) -> Self {
        Self {
            trial,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TrialOutcome {
    Success(TrialRecord),
    Failure(TrialFailure),
}

/// Result of a full run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Number of trials requested.
    pub trials: usize,
    /// Completed trials, in trial order.
    pub records: Vec<TrialRecord>,
    /// Failed trials, in trial order.
    pub failures: Vec<TrialFailure>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl AggregateResult {
    pub fn from_outcomes(trials: usize, outcomes: Vec<TrialOutcome>, elapsed: Duration) -> Self {
        let mut records = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                TrialOutcome::Success(r) => records.push(r),
                TrialOutcome::Failure(f) => failures.push(f),
            }
        }
        Self {
            trials,
            records,
            failures,
            elapsed,
        }
    }

    pub fn successful(&self) -> usize {
        self.records.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// `successful / trials`, or 0 when no trials were requested.
    pub fn success_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.successful() as f64 / self.trials as f64
    }

    /// Success rate as a percentage string, e.g. `"90%"` or `"66.67%"`.
    pub fn success_rate_label(&self) -> String {
        format_percentage(self.success_rate())
    }
}

/// Format a fraction as a percentage rounded to two decimals, without
/// trailing zeros (`0.9` → `"90%"`, `0` → `"0%"`).
pub fn format_percentage(fraction: f64) -> String {
    let pct = (fraction * 10_000.0).round() / 100.0;
    format!("{}%", pct)
}

// ── Preparation ─────────────────────────────────────────────────────

/// A validated player: resolved scenario rows plus the parsed formula.
///
/// A formula that fails to parse or names an undeclared variable is kept as
/// its error; every trial then records that error as its failure.
pub struct PreparedPlayer<'a> {
    pub tag: PlayerTag,
    pub spec: &'a PlayerSpec,
    pub formula: Result<Formula, FormulaError>,
    pub rows: ScenarioRows,
}

impl<'a> PreparedPlayer<'a> {
    pub fn new(spec: &'a PlayerSpec, tag: PlayerTag) -> Result<Self, SimulationError> {
        let rows = spec.validate(tag)?;
        let formula = Formula::parse(&spec.formula).and_then(|f| {
            f.check_declared(&spec.variables)?;
            Ok(f)
        });
        if let Err(e) = &formula {
            warn!(player = %tag, kind = e.kind(), error = %e, "formula rejected");
        }
        Ok(Self {
            tag,
            spec,
            formula,
            rows,
        })
    }

    /// Draw every variable for `scenario` into `sampled`; returns the draws in
    /// variable order.
    fn draw<S: NoiseSource>(
        &self,
        source: &mut S,
        scenario: Scenario,
        policy: &SamplingPolicy,
        sampled: &mut SampledValues,
    ) -> Result<Vec<f64>, TrialError> {
        let means = &self.spec.scenario_values[self.rows.row(scenario)];
        let mut draws = Vec::with_capacity(self.spec.variables.len());
        for (def, &mean) in self.spec.variables.iter().zip(means) {
            let value = sample_variable(source, def, mean, self.tag, policy.clamp_samples)?;
            sampled.insert(&def.id, self.tag, value);
            draws.push(value);
        }
        Ok(draws)
    }

    fn payoff(
        &self,
        sampled: &SampledValues,
        scenario: Scenario,
        policy: &SamplingPolicy,
    ) -> Result<f64, TrialError> {
        self.formula
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|f| {
                f.evaluate_with(sampled, self.tag, &self.spec.variables, policy.eval_options())
            })
            .map_err(|source| TrialError::Formula {
                player: self.tag,
                scenario,
                source,
            })
    }
}

// ── Trials ──────────────────────────────────────────────────────────

/// Run one trial: four scenario sweeps, then the solver.
pub fn run_trial<S: NoiseSource, E: EquilibriumSolver + ?Sized>(
    trial: usize,
    player_a: &PreparedPlayer<'_>,
    player_b: &PreparedPlayer<'_>,
    source: &mut S,
    solver: &E,
    policy: &SamplingPolicy,
) -> Result<TrialRecord, TrialError> {
    let mut payoffs = ScenarioPayoffs::new();
    let mut samples = BTreeMap::new();

    for scenario in Scenario::ALL {
        let mut sampled = SampledValues::new();
        let draws_a = player_a.draw(source, scenario, policy, &mut sampled)?;
        let draws_b = player_b.draw(source, scenario, policy, &mut sampled)?;

        let a = player_a.payoff(&sampled, scenario, policy)?;
        let b = player_b.payoff(&sampled, scenario, policy)?;
        payoffs.insert(scenario, PayoffPair::new(a, b));
        samples.insert(
            scenario,
            ScenarioSamples {
                player_a: draws_a,
                player_b: draws_b,
            },
        );
    }

    let outcomes = outcome_list(&payoffs).ok_or(SolverError::OutcomeCount {
        expected: SCENARIO_COUNT,
        actual: payoffs.len(),
    })?;
    let equilibrium = solver.solve(&outcomes)?;

    Ok(TrialRecord {
        trial,
        payoffs,
        samples,
        equilibrium,
    })
}

/// Run a full simulation with normal noise seeded from `config.seed` and the
/// backward-induction solver.
pub fn run(
    player_a: &PlayerSpec,
    player_b: &PlayerSpec,
    config: &SimulationConfig,
) -> Result<AggregateResult, SimulationError> {
    run_with(
        player_a,
        player_b,
        config,
        &SeededNormal::new(config.seed),
        &BackwardInduction,
    )
}

/// Run a full simulation with explicit sampler and solver handles.
pub fn run_with<F: SamplerFactory, E: EquilibriumSolver>(
    player_a: &PlayerSpec,
    player_b: &PlayerSpec,
    config: &SimulationConfig,
    sampler: &F,
    solver: &E,
) -> Result<AggregateResult, SimulationError> {
    let a = PreparedPlayer::new(player_a, PlayerTag::A)?;
    let b = PreparedPlayer::new(player_b, PlayerTag::B)?;

    info!(
        trials = config.trials,
        seed = config.seed,
        parallel = config.parallel,
        "starting simulation"
    );
    let start = Instant::now();
    let policy = config.sampling;

    let play = |trial: usize| -> TrialOutcome {
        let mut source = sampler.for_trial(trial);
        match run_trial(trial, &a, &b, &mut source, solver, &policy) {
            Ok(record) => {
                debug!(trial, outcome = %record.equilibrium.outcome, "trial complete");
                TrialOutcome::Success(record)
            }
            Err(err) => {
                warn!(trial, kind = err.kind(), error = %err, "trial failed");
                TrialOutcome::Failure(TrialFailure::new(trial, &err))
            }
        }
    };

    let outcomes: Vec<TrialOutcome> = if config.parallel {
        (0..config.trials).into_par_iter().map(play).collect()
    } else {
        (0..config.trials).map(play).collect()
    };

    let result = AggregateResult::from_outcomes(config.trials, outcomes, start.elapsed());
    info!(
        successful = result.successful(),
        failed = result.failed(),
        success_rate = %result.success_rate_label(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "simulation finished"
    );
    Ok(result)
}

//! Error types for formula evaluation, equilibrium solving, trials, and runs.
//!
//! Two layers:
//! - [`TrialError`]: anything that can go wrong inside one trial. The orchestrator
//!   downgrades these to a recorded failure and moves on to the next trial.
//! - [`SimulationError`]: structural problems found before the first trial. These
//!   fail the whole run.
//!
//! Every error exposes a stable classification label for diagnostics and export.

use crate::types::{PlayerTag, Scenario};

// ── Formula errors ──────────────────────────────────────────────────

/// Errors raised while resolving or evaluating a payoff formula.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("variable '{id}' has degenerate bounds (min = max = {bound}); cannot standardize")]
    DegenerateBounds { id: String, bound: f64 },

    #[error("invalid expression: {message}")]
    InvalidExpression { message: String },

    #[error("evaluation failed: {message}")]
    EvaluationFailed { message: String },
}

impl FormulaError {
    pub fn kind(&self) -> &'static str {
        match self {
            FormulaError::UnknownVariable { .. } => "UnknownVariable",
            FormulaError::DegenerateBounds { .. } => "DegenerateBounds",
            FormulaError::InvalidExpression { .. } => "InvalidExpression",
            FormulaError::EvaluationFailed { .. } => "EvaluationFailed",
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        FormulaError::InvalidExpression {
            message: message.into(),
        }
    }

    pub(crate) fn failed(message: impl Into<String>) -> Self {
        FormulaError::EvaluationFailed {
            message: message.into(),
        }
    }
}

// ── Solver errors ───────────────────────────────────────────────────

/// Errors raised by an equilibrium solver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("expected {expected} outcomes, got {actual}")]
    OutcomeCount { expected: usize, actual: usize },

    #[error("payoff for {scenario} is not finite ({a}, {b})")]
    NonFinitePayoff {
        scenario: &'static str,
        a: f64,
        b: f64,
    },

    #[error("equilibrium requested before the game was solved")]
    Unsolved,
}

// ── Trial errors ────────────────────────────────────────────────────

/// Anything that aborts a single trial.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrialError {
    #[error("player {player} formula in scenario {scenario}: {source}")]
    Formula {
        player: PlayerTag,
        scenario: Scenario,
        #[source]
        source: FormulaError,
    },

    #[error("solver failure: {0}")]
    Solver(#[from] SolverError),

    #[error("sampling failure for '{variable}': {message}")]
    Sampling { variable: String, message: String },
}

impl TrialError {
    /// Classification label recorded in the failure log.
    pub fn kind(&self) -> &'static str {
        match self {
            TrialError::Formula { source, .. } => source.kind(),
            TrialError::Solver(_) => "SolverFailure",
            TrialError::Sampling { .. } => "SamplingFailure",
        }
    }
}

// ── Run-level errors ────────────────────────────────────────────────

pub const INVALID_PLAYER_SPEC: &str = "INVALID_PLAYER_SPEC";

/// Structural errors detected before any trial begins.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("player {player}: scenario '{label}' is missing")]
    MissingScenario {
        player: PlayerTag,
        label: &'static str,
    },

    #[error("player {player}: scenario '{label}' is declared more than once")]
    DuplicateScenario { player: PlayerTag, label: String },

    #[error("player {player}: variable '{id}' is declared more than once")]
    DuplicateVariable { player: PlayerTag, id: String },

    #[error("player {player}: scenarioValues has {actual} rows, expected {expected} (one per scenario)")]
    ScenarioRowCount {
        player: PlayerTag,
        expected: usize,
        actual: usize,
    },

    #[error("player {player}: scenarioValues row for '{scenario}' has {actual} values, expected {expected} (one per variable)")]
    ScenarioRowWidth {
        player: PlayerTag,
        scenario: String,
        expected: usize,
        actual: usize,
    },

    #[error("player {player}: scenarioValues row for '{scenario}' has a non-finite value for '{id}'")]
    NonFiniteMean {
        player: PlayerTag,
        scenario: String,
        id: String,
    },

    #[error("player {player}: variable '{id}' has min {min} > max {max}")]
    InvalidBounds {
        player: PlayerTag,
        id: String,
        min: f64,
        max: f64,
    },

    #[error("player {player}: variable '{id}' has invalid stdev {stdev}")]
    InvalidStdev {
        player: PlayerTag,
        id: String,
        stdev: f64,
    },
}

impl SimulationError {
    pub fn error_code(&self) -> &'static str {
        INVALID_PLAYER_SPEC
    }
}

// ── Export errors ───────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Configuration errors ────────────────────────────────────────────

/// Errors loading environment settings or request files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

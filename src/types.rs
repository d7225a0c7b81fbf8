//! Core data structures: players, moves, scenarios, variable definitions, and
//! per-trial sampled values.
//!
//! [`PlayerSpec`] is the per-player input (formula, variables, scenario means).
//! It is immutable for the lifetime of a run and shared read-only across worker
//! threads. [`PlayerSpec::validate`] checks every structural invariant once,
//! before the first trial, and resolves the row of `scenario_values` that feeds
//! each of the four fixed scenarios.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::SimulationError;

// ── Players, moves, scenarios ───────────────────────────────────────

/// Player tag: A moves first, B responds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerTag {
    A,
    B,
}

impl fmt::Display for PlayerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerTag::A => f.write_str("A"),
            PlayerTag::B => f.write_str("B"),
        }
    }
}

/// A player's move. Declaration order (Tariff, NoTariff) is also the
/// tie-breaking order used by the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    #[serde(rename = "T")]
    Tariff,
    #[serde(rename = "NT")]
    NoTariff,
}

impl Move {
    pub const ALL: [Move; 2] = [Move::Tariff, Move::NoTariff];

    pub fn code(self) -> &'static str {
        match self {
            Move::Tariff => "T",
            Move::NoTariff => "NT",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One of the four terminal histories. Variant order matches [`SCENARIO_ORDER`],
/// so `BTreeMap<Scenario, _>` iterates in solver order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "NT_NT")]
    NtNt,
    #[serde(rename = "T_NT")]
    TNt,
    #[serde(rename = "NT_T")]
    NtT,
    #[serde(rename = "T_T")]
    TT,
}

impl Scenario {
    pub const ALL: [Scenario; SCENARIO_COUNT] =
        [Scenario::NtNt, Scenario::TNt, Scenario::NtT, Scenario::TT];

    pub fn label(self) -> &'static str {
        SCENARIO_ORDER[self.index()]
    }

    /// Position in the solver's outcome list.
    pub fn index(self) -> usize {
        match self {
            Scenario::NtNt => 0,
            Scenario::TNt => 1,
            Scenario::NtT => 2,
            Scenario::TT => 3,
        }
    }

    /// Parse a label, ignoring surrounding whitespace and case.
    pub fn from_label(label: &str) -> Option<Scenario> {
        let label = label.trim();
        Scenario::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }

    /// (A's move, B's move).
    pub fn moves(self) -> (Move, Move) {
        match self {
            Scenario::NtNt => (Move::NoTariff, Move::NoTariff),
            Scenario::TNt => (Move::Tariff, Move::NoTariff),
            Scenario::NtT => (Move::NoTariff, Move::Tariff),
            Scenario::TT => (Move::Tariff, Move::Tariff),
        }
    }

    pub fn from_moves(a: Move, b: Move) -> Scenario {
        match (a, b) {
            (Move::NoTariff, Move::NoTariff) => Scenario::NtNt,
            (Move::Tariff, Move::NoTariff) => Scenario::TNt,
            (Move::NoTariff, Move::Tariff) => Scenario::NtT,
            (Move::Tariff, Move::Tariff) => Scenario::TT,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Payoffs ─────────────────────────────────────────────────────────

/// (payoff A, payoff B) for one terminal history.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayoffPair {
    pub a: f64,
    pub b: f64,
}

impl PayoffPair {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    pub fn get(&self, player: PlayerTag) -> f64 {
        match player {
            PlayerTag::A => self.a,
            PlayerTag::B => self.b,
        }
    }
}

/// Scenario → payoff pair. Iterates in solver order.
pub type ScenarioPayoffs = BTreeMap<Scenario, PayoffPair>;

/// Assemble the ordered outcome list `[NT_NT, T_NT, NT_T, T_T]`.
/// Returns None if any of the four scenarios is missing.
pub fn outcome_list(payoffs: &ScenarioPayoffs) -> Option<[PayoffPair; SCENARIO_COUNT]> {
    let mut out = [PayoffPair::new(0.0, 0.0); SCENARIO_COUNT];
    for scenario in Scenario::ALL {
        out[scenario.index()] = *payoffs.get(&scenario)?;
    }
    Some(out)
}

// ── Variable definitions ────────────────────────────────────────────

/// Direction in which a variable improves a player's payoff.
/// Anything other than "negative" (including a missing field) is positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum DesiredEffect {
    #[default]
    Positive,
    Negative,
}

impl From<Option<String>> for DesiredEffect {
    fn from(raw: Option<String>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("negative") => DesiredEffect::Negative,
            _ => DesiredEffect::Positive,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub id: String,
    pub min: f64,
    pub max: f64,
    pub stdev: f64,
    #[serde(default)]
    pub desired_effect: DesiredEffect,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl VariableDefinition {
    pub fn new(id: &str, min: f64, max: f64, stdev: f64) -> Self {
        Self {
            id: id.to_string(),
            min,
            max,
            stdev,
            desired_effect: DesiredEffect::Positive,
            weight: None,
        }
    }

    pub fn with_effect(mut self, effect: DesiredEffect) -> Self {
        self.desired_effect = effect;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Weight substituted for `<id>_weight`, defaulting to 0.5.
    pub fn effective_weight(&self) -> f64 {
        self.weight.unwrap_or(DEFAULT_WEIGHT)
    }
}

// ── Player spec ─────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSpec {
    pub formula: String,
    pub variables: Vec<VariableDefinition>,
    pub scenarios: Vec<String>,
    pub scenario_values: Vec<Vec<f64>>,
}

/// Row of `scenario_values` for each fixed scenario, indexed by [`Scenario::index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScenarioRows(pub [usize; SCENARIO_COUNT]);

impl ScenarioRows {
    pub fn row(&self, scenario: Scenario) -> usize {
        self.0[scenario.index()]
    }
}

impl PlayerSpec {
    /// Check the structural invariants and resolve scenario rows.
    pub fn validate(&self, player: PlayerTag) -> Result<ScenarioRows, SimulationError> {
        let mut seen = HashSet::new();
        for var in &self.variables {
            if !seen.insert(var.id.to_ascii_lowercase()) {
                return Err(SimulationError::DuplicateVariable {
                    player,
                    id: var.id.clone(),
                });
            }
            if var.min.is_nan() || var.max.is_nan() || var.min > var.max {
                return Err(SimulationError::InvalidBounds {
                    player,
                    id: var.id.clone(),
                    min: var.min,
                    max: var.max,
                });
            }
            if !var.stdev.is_finite() || var.stdev < 0.0 {
                return Err(SimulationError::InvalidStdev {
                    player,
                    id: var.id.clone(),
                    stdev: var.stdev,
                });
            }
        }

        if self.scenario_values.len() != self.scenarios.len() {
            return Err(SimulationError::ScenarioRowCount {
                player,
                expected: self.scenarios.len(),
                actual: self.scenario_values.len(),
            });
        }

        let mut rows: [Option<usize>; SCENARIO_COUNT] = [None; SCENARIO_COUNT];
        let mut labels = HashSet::new();
        for (row, label) in self.scenarios.iter().enumerate() {
            if !labels.insert(label.trim().to_ascii_uppercase()) {
                return Err(SimulationError::DuplicateScenario {
                    player,
                    label: label.clone(),
                });
            }
            let values = &self.scenario_values[row];
            if values.len() != self.variables.len() {
                return Err(SimulationError::ScenarioRowWidth {
                    player,
                    scenario: label.clone(),
                    expected: self.variables.len(),
                    actual: values.len(),
                });
            }
            if let Some(i) = values.iter().position(|v| !v.is_finite()) {
                return Err(SimulationError::NonFiniteMean {
                    player,
                    scenario: label.clone(),
                    id: self.variables[i].id.clone(),
                });
            }
            if let Some(scenario) = Scenario::from_label(label) {
                rows[scenario.index()] = Some(row);
            }
        }

        let mut resolved = [0usize; SCENARIO_COUNT];
        for scenario in Scenario::ALL {
            match rows[scenario.index()] {
                Some(row) => resolved[scenario.index()] = row,
                None => {
                    return Err(SimulationError::MissingScenario {
                        player,
                        label: scenario.label(),
                    })
                }
            }
        }
        Ok(ScenarioRows(resolved))
    }
}

// ── Sampled values ──────────────────────────────────────────────────

/// Player-qualified variable key, rendered `<id>_<tag>` (e.g. `v1_A`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableKey {
    pub id: String,
    pub player: PlayerTag,
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.id, self.player)
    }
}

/// Sampled values for one scenario of one trial. Consumed by the formula
/// evaluator, then discarded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampledValues {
    values: BTreeMap<VariableKey, f64>,
}

impl SampledValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, player: PlayerTag, value: f64) {
        self.values.insert(
            VariableKey {
                id: id.to_string(),
                player,
            },
            value,
        );
    }

    pub fn get(&self, id: &str, player: PlayerTag) -> Option<f64> {
        self.values
            .iter()
            .find(|(k, _)| k.player == player && k.id.eq_ignore_ascii_case(id))
            .map(|(_, &v)| v)
    }

    /// (id, value) pairs carrying the given player tag.
    pub fn for_player(&self, player: PlayerTag) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values
            .iter()
            .filter(move |(k, _)| k.player == player)
            .map(|(k, &v)| (k.id.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

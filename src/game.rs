//! Sequential tariff game and its backward-induction solver.
//!
//! Player A moves first (Tariff / No Tariff); player B observes A's move and
//! responds (Tariff / No Tariff). The four terminal histories carry the payoff
//! pairs in [`SCENARIO_ORDER`](crate::constants::SCENARIO_ORDER).
//!
//! Backward induction runs in two stages, deepest first:
//! 1. For each of A's moves, B picks the response maximizing B's payoff.
//! 2. A picks the move maximizing A's payoff given B's responses.
//!
//! Ties go to the move declared first ([`Move::ALL`]: Tariff before No Tariff),
//! so the equilibrium is always unique and reproducible.

use std::fmt;

use serde::Serialize;

use crate::constants::SCENARIO_COUNT;
use crate::error::SolverError;
use crate::types::{Move, PayoffPair, Scenario};

/// Subgame-perfect equilibrium: A's move, B's full response strategy, and the
/// resulting outcome.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Equilibrium {
    pub player_a: Move,
    /// B's reply when A plays Tariff.
    pub response_to_tariff: Move,
    /// B's reply when A plays No Tariff.
    pub response_to_no_tariff: Move,
    pub outcome: Scenario,
    pub payoffs: PayoffPair,
}

impl Equilibrium {
    pub fn response_to(&self, a: Move) -> Move {
        match a {
            Move::Tariff => self.response_to_tariff,
            Move::NoTariff => self.response_to_no_tariff,
        }
    }
}

impl fmt::Display for Equilibrium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A: {}; B: T->{}, NT->{}; outcome {} ({}, {})",
            self.player_a,
            self.response_to_tariff,
            self.response_to_no_tariff,
            self.outcome,
            self.payoffs.a,
            self.payoffs.b
        )
    }
}

/// Two-stage extensive-form game over the four tariff scenarios.
#[derive(Clone, Debug)]
pub struct ExtensiveGame {
    outcomes: [PayoffPair; SCENARIO_COUNT],
    solution: Option<Equilibrium>,
}

impl ExtensiveGame {
    /// Build the game from outcomes ordered `[NT_NT, T_NT, NT_T, T_T]`.
    pub fn new(outcomes: &[PayoffPair]) -> Result<Self, SolverError> {
        if outcomes.len() != SCENARIO_COUNT {
            return Err(SolverError::OutcomeCount {
                expected: SCENARIO_COUNT,
                actual: outcomes.len(),
            });
        }
        let mut ordered = [PayoffPair::new(0.0, 0.0); SCENARIO_COUNT];
        for scenario in Scenario::ALL {
            let p = outcomes[scenario.index()];
            if !p.a.is_finite() || !p.b.is_finite() {
                return Err(SolverError::NonFinitePayoff {
                    scenario: scenario.label(),
                    a: p.a,
                    b: p.b,
                });
            }
            ordered[scenario.index()] = p;
        }
        Ok(Self {
            outcomes: ordered,
            solution: None,
        })
    }

    pub fn payoff(&self, scenario: Scenario) -> PayoffPair {
        self.outcomes[scenario.index()]
    }

    /// B's best response to `a`.
    fn best_response(&self, a: Move) -> Move {
        let mut best = Move::ALL[0];
        let mut best_val = f64::NEG_INFINITY;
        for b in Move::ALL {
            let val = self.payoff(Scenario::from_moves(a, b)).b;
            if val > best_val {
                best_val = val;
                best = b;
            }
        }
        best
    }

    /// Compute the backward-induction equilibrium.
    pub fn solve(&mut self) -> &Equilibrium {
        let response_to_tariff = self.best_response(Move::Tariff);
        let response_to_no_tariff = self.best_response(Move::NoTariff);

        let mut player_a = Move::ALL[0];
        let mut best_val = f64::NEG_INFINITY;
        for a in Move::ALL {
            let b = match a {
                Move::Tariff => response_to_tariff,
                Move::NoTariff => response_to_no_tariff,
            };
            let val = self.payoff(Scenario::from_moves(a, b)).a;
            if val > best_val {
                best_val = val;
                player_a = a;
            }
        }

        let b = match player_a {
            Move::Tariff => response_to_tariff,
            Move::NoTariff => response_to_no_tariff,
        };
        let outcome = Scenario::from_moves(player_a, b);
        self.solution.insert(Equilibrium {
            player_a,
            response_to_tariff,
            response_to_no_tariff,
            outcome,
            payoffs: self.payoff(outcome),
        })
    }

    /// The equilibrium found by [`solve`](Self::solve).
    pub fn record_equilibrium(&self) -> Result<Equilibrium, SolverError> {
        self.solution.ok_or(SolverError::Unsolved)
    }
}

/// Equilibrium solver used by the orchestrator, one call per trial.
pub trait EquilibriumSolver: Sync {
    fn solve(&self, outcomes: &[PayoffPair]) -> Result<Equilibrium, SolverError>;
}

/// Default solver: builds an [`ExtensiveGame`] and runs backward induction.
#[derive(Clone, Copy, Debug, Default)]
pub struct BackwardInduction;

impl EquilibriumSolver for BackwardInduction {
    fn solve(&self, outcomes: &[PayoffPair]) -> Result<Equilibrium, SolverError> {
        let mut game = ExtensiveGame::new(outcomes)?;
        game.solve();
        game.record_equilibrium()
    }
}

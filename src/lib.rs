//! # Tariff game: Monte Carlo equilibrium estimator
//!
//! Two countries choose whether to impose a tariff. Player A moves first,
//! Player B responds. Each player's payoff is a user-supplied arithmetic
//! formula over uncertain variables; every trial samples those variables
//! around scenario-specific means, evaluates the formulas for all four move
//! combinations and solves the resulting two-stage game by **backward
//! induction**.
//!
//! ## Components
//!
//! | Component | Rust module | Description |
//! |-----------|-------------|-------------|
//! | Variable sampler | [`sampling`] | Normal noise around a scenario mean, clamped to variable bounds |
//! | Formula evaluator | [`formula`] | Tokenize, parse and evaluate payoff formulas with `_Val` / `_weight` / `_stnd` references |
//! | Simulation orchestrator | [`simulation::engine`] | Validate inputs once, then run independent trials (rayon) with per-trial failure isolation |
//! | Equilibrium solver | [`game`] | Two-stage extensive-form game solved by backward induction |
//! | Result aggregator | [`simulation::tables`], [`simulation::statistics`] | Per-trial tables, payoff distributions, outcome frequencies |
//!
//! ## Scenario order
//!
//! Payoffs always reach the solver in the order `[NT_NT, T_NT, NT_T, T_T]`
//! (first code is A's move, second is B's). [`types::Scenario`] encodes that
//! order, and every map keyed by it iterates the same way.
//!
//! ## Determinism
//!
//! Trial `i` draws from `SmallRng::seed_from_u64(seed + i)`, so results are
//! identical for sequential and parallel runs with the same seed.

pub mod config;
pub mod constants;
pub mod env_config;
pub mod error;
pub mod formula;
pub mod game;
pub mod sampling;
pub mod server;
pub mod simulation;
pub mod types;

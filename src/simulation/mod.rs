//! Monte Carlo simulation and result aggregation.
//!
//! - [`engine`]: Orchestrator (run N independent trials of the tariff game)
//! - [`statistics`]: Payoff distributions and equilibrium outcome frequencies
//! - [`tables`]: Per-trial tables of sampled variables, payoffs and equilibria
//! - [`export`]: CSV/JSON output of tables

pub mod engine;
pub mod export;
pub mod statistics;
pub mod tables;

// Re-export commonly used items
pub use engine::{
    format_percentage, run, run_trial, run_with, AggregateResult, PreparedPlayer,
    ScenarioSamples, TrialFailure, TrialOutcome, TrialRecord,
};
pub use export::{save_json, save_tables};
pub use statistics::{aggregate_statistics, RunStatistics};
pub use tables::{build_tables, ResultTables};

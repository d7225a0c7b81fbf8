//! Game constants: scenario labels, player tags, and defaults.
//!
//! A scenario label is `<A move>_<B move>` where `T` is a tariff and `NT` is no
//! tariff. The solver always receives the four outcomes in [`SCENARIO_ORDER`].

/// Number of terminal histories in the sequential tariff game (2 moves × 2 moves).
pub const SCENARIO_COUNT: usize = 4;

pub const SCENARIO_NT_NT: &str = "NT_NT";
pub const SCENARIO_T_NT: &str = "T_NT";
pub const SCENARIO_NT_T: &str = "NT_T";
pub const SCENARIO_T_T: &str = "T_T";

/// Outcome order submitted to the equilibrium solver.
pub const SCENARIO_ORDER: [&str; SCENARIO_COUNT] =
    [SCENARIO_NT_NT, SCENARIO_T_NT, SCENARIO_NT_T, SCENARIO_T_T];

/// Weight substituted for `<id>_weight` when a variable declares none.
pub const DEFAULT_WEIGHT: f64 = 0.5;

/// Identifier suffixes recognized by the formula resolver (compared lowercase).
pub const SUFFIX_WEIGHT: &str = "_weight";
pub const SUFFIX_STANDARDIZED: &str = "_stnd";
pub const SUFFIX_RAW: &str = "_val";

/// Default number of trials per run.
pub const DEFAULT_TRIALS: usize = 1000;

/// Default RNG seed for a run.
pub const DEFAULT_SEED: u64 = 42;

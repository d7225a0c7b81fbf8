//! Integration tests for the simulation orchestrator.

use std::sync::Mutex;

use tariffgame::config::SimulationConfig;
use tariffgame::error::{SimulationError, SolverError};
use tariffgame::game::{BackwardInduction, Equilibrium, EquilibriumSolver};
use tariffgame::sampling::{NoiseSource, SamplerFactory, SeededNormal};
use tariffgame::simulation::{aggregate_statistics, build_tables, run, run_with};
use tariffgame::types::{Move, PayoffPair, PlayerSpec, Scenario, VariableDefinition};

/// Two variables with zero noise; scenario rows listed out of order.
fn player(formula: &str) -> PlayerSpec {
    PlayerSpec {
        formula: formula.into(),
        variables: vec![
            VariableDefinition::new("v1", -10.0, 10.0, 0.0),
            VariableDefinition::new("v2", -10.0, 10.0, 0.0),
        ],
        scenarios: vec!["T_T".into(), "nt_nt".into(), "NT_T".into(), " T_NT ".into()],
        scenario_values: vec![
            vec![7.0, 8.0],
            vec![1.0, 2.0],
            vec![5.0, 6.0],
            vec![3.0, 4.0],
        ],
    }
}

/// Returns the mean unchanged, except on one trial where every draw is 0.
struct FailOnTrial(usize);

struct Flat {
    zero: bool,
}

impl NoiseSource for Flat {
    fn sample_from_distribution(&mut self, mean: f64, _stdev: f64, count: usize) -> Vec<f64> {
        vec![if self.zero { 0.0 } else { mean }; count]
    }
}

impl SamplerFactory for FailOnTrial {
    type Source = Flat;

    fn for_trial(&self, trial: usize) -> Flat {
        Flat {
            zero: trial == self.0,
        }
    }
}

/// Records every outcome list it is asked to solve.
#[derive(Default)]
struct RecordingSolver {
    seen: Mutex<Vec<Vec<PayoffPair>>>,
}

impl EquilibriumSolver for RecordingSolver {
    fn solve(&self, outcomes: &[PayoffPair]) -> Result<Equilibrium, SolverError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(outcomes.to_vec());
        }
        BackwardInduction.solve(outcomes)
    }
}

/// Fails on the n-th call. Used with sequential runs, where call n is trial n.
struct FailingSolver {
    fail_on: usize,
    calls: Mutex<usize>,
}

impl FailingSolver {
    fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: Mutex::new(0),
        }
    }
}

impl EquilibriumSolver for FailingSolver {
    fn solve(&self, outcomes: &[PayoffPair]) -> Result<Equilibrium, SolverError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls - 1
        };
        if call == self.fail_on {
            return Err(SolverError::Unsolved);
        }
        BackwardInduction.solve(outcomes)
    }
}

#[test]
fn failed_trial_is_isolated() {
    let cfg = SimulationConfig::default().with_trials(10);
    let result = run_with(
        &player("v1 / v2"),
        &player("v2"),
        &cfg,
        &FailOnTrial(3),
        &BackwardInduction,
    )
    .unwrap();

    assert_eq!(result.successful(), 9);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.failures[0].trial, 3);
    assert_eq!(result.failures[0].kind, "EvaluationFailed");
    assert!(result.records.iter().all(|r| r.trial != 3));
    assert_eq!(result.success_rate_label(), "90%");

    let tables = build_tables(&result, &player("v1 / v2"), &player("v2"));
    assert_eq!(tables.payoffs.rows.len(), 9);
    assert_eq!(tables.failures.len(), 1);
}

#[test]
fn zero_trials_report_zero_percent() {
    let cfg = SimulationConfig::default().with_trials(0);
    let result = run(&player("v1"), &player("v2"), &cfg).unwrap();
    assert!(result.records.is_empty());
    assert_eq!(aggregate_statistics(&result).success_rate, "0%");
}

#[test]
fn solver_receives_payoffs_in_scenario_order() {
    let solver = RecordingSolver::default();
    let cfg = SimulationConfig::default().with_trials(1);
    let result = run_with(&player("v1"), &player("v2"), &cfg, &SeededNormal::new(7), &solver)
        .unwrap();
    assert_eq!(result.successful(), 1);

    let seen = solver.seen.lock().unwrap();
    assert_eq!(
        seen[0],
        vec![
            PayoffPair::new(1.0, 2.0),
            PayoffPair::new(3.0, 4.0),
            PayoffPair::new(5.0, 6.0),
            PayoffPair::new(7.0, 8.0),
        ]
    );

    // B maximizes its own payoff: T after T (8 > 4), T after NT (6 > 2).
    // A then compares T_T (7) with NT_T (5).
    let eq = result.records[0].equilibrium;
    assert_eq!(eq.response_to(Move::Tariff), Move::Tariff);
    assert_eq!(eq.response_to(Move::NoTariff), Move::Tariff);
    assert_eq!(eq.player_a, Move::Tariff);
    assert_eq!(eq.outcome, Scenario::TT);
}

#[test]
fn parallel_matches_sequential() {
    let mut a = player("v1_stnd * v1_weight + v2");
    let mut b = player("v2_Val - v1_val");
    for v in a.variables.iter_mut().chain(b.variables.iter_mut()) {
        v.stdev = 2.5;
    }
    let cfg = SimulationConfig::default().with_trials(64).with_seed(1234);
    let parallel = run(&a, &b, &cfg).unwrap();
    let sequential = run(&a, &b, &cfg.sequential()).unwrap();
    assert_eq!(parallel.records, sequential.records);
    assert_eq!(parallel.failures, sequential.failures);

    let other_seed = run(&a, &b, &cfg.with_seed(99)).unwrap();
    assert_ne!(parallel.records, other_seed.records);
}

#[test]
fn clamped_samples_stay_within_bounds() {
    let mut a = player("v1");
    a.variables[0].stdev = 50.0;
    let cfg = SimulationConfig::default().with_trials(50);
    let result = run(&a, &player("v2"), &cfg).unwrap();
    for rec in &result.records {
        for s in rec.samples.values() {
            assert!(s.player_a.iter().all(|&v| (-10.0..=10.0).contains(&v)));
        }
    }

    let mut unclamped = cfg;
    unclamped.sampling.clamp_samples = false;
    let result = run(&a, &player("v2"), &unclamped).unwrap();
    let escaped = result
        .records
        .iter()
        .flat_map(|r| r.samples.values())
        .any(|s| s.player_a[0].abs() > 10.0);
    assert!(escaped);
}

#[test]
fn undeclared_reference_fails_every_trial() {
    let cfg = SimulationConfig::default().with_trials(4);
    let result = run(&player("v1 + v3_stnd"), &player("v2"), &cfg).unwrap();
    assert!(result.records.is_empty());
    assert_eq!(result.failed(), 4);
    assert_eq!(
        result.failures.iter().map(|f| f.trial).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    for f in &result.failures {
        assert_eq!(f.kind, "UnknownVariable");
        assert!(f.message.contains("v3_stnd"), "{}", f.message);
    }
    assert_eq!(aggregate_statistics(&result).success_rate, "0%");
}

#[test]
fn overlong_formula_fails_every_trial() {
    let chain = vec!["v1"; 100_000].join("+");
    let cfg = SimulationConfig::default().with_trials(2);
    let result = run(&player("v1"), &player(&chain), &cfg).unwrap();
    assert_eq!(result.failed(), 2);
    assert!(result.failures.iter().all(|f| f.kind == "EvaluationFailed"));
}

#[test]
fn solver_failure_is_isolated() {
    let cfg = SimulationConfig::default().with_trials(6).sequential();
    let result = run_with(
        &player("v1"),
        &player("v2"),
        &cfg,
        &SeededNormal::new(3),
        &FailingSolver::new(4),
    )
    .unwrap();
    assert_eq!(result.successful(), 5);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.failures[0].trial, 4);
    assert_eq!(result.failures[0].kind, "SolverFailure");
    assert!(result.records.iter().all(|r| r.trial != 4));
}

#[test]
fn missing_scenario_fails_whole_run() {
    let mut b = player("v2");
    b.scenarios[2] = "X_Y".into();
    let err = run(&player("v1"), &b, &SimulationConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::MissingScenario { label: "NT_T", .. }
    ));
}

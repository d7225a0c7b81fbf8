//! Run statistics over completed trials.
//!
//! Per-scenario payoff distributions for both players and how often each
//! terminal history is the equilibrium outcome. Failed trials are excluded; they
//! stay in the failure log.

use serde::Serialize;

use crate::constants::SCENARIO_COUNT;
use crate::types::{Move, PlayerTag, Scenario};

use super::engine::{AggregateResult, TrialRecord};

// ── Top-level statistics ────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub trials: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: String,
    pub scenarios: Vec<ScenarioStatistics>,
    pub outcomes: Vec<OutcomeFrequency>,
    /// Share of successful trials in which A opens with a tariff.
    pub first_move_tariff_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffDistribution {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStatistics {
    pub scenario: Scenario,
    pub player_a: PayoffDistribution,
    pub player_b: PayoffDistribution,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeFrequency {
    pub scenario: Scenario,
    pub count: usize,
    pub share: f64,
}

// ── Aggregation ─────────────────────────────────────────────────────

fn distribution(values: &[f64]) -> PayoffDistribution {
    if values.is_empty() {
        return PayoffDistribution {
            mean: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PayoffDistribution {
        mean,
        std_dev: variance.sqrt(),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn payoffs_for(records: &[TrialRecord], scenario: Scenario, player: PlayerTag) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.payoffs.get(&scenario))
        .map(|p| p.get(player))
        .collect()
}

pub fn aggregate_statistics(result: &AggregateResult) -> RunStatistics {
    let records = &result.records;
    let n = records.len();
    let share = |count: usize| if n == 0 { 0.0 } else { count as f64 / n as f64 };

    let scenarios = Scenario::ALL
        .into_iter()
        .map(|scenario| ScenarioStatistics {
            scenario,
            player_a: distribution(&payoffs_for(records, scenario, PlayerTag::A)),
            player_b: distribution(&payoffs_for(records, scenario, PlayerTag::B)),
        })
        .collect();

    let mut counts = [0usize; SCENARIO_COUNT];
    for r in records {
        counts[r.equilibrium.outcome.index()] += 1;
    }
    let outcomes = Scenario::ALL
        .into_iter()
        .map(|scenario| OutcomeFrequency {
            scenario,
            count: counts[scenario.index()],
            share: share(counts[scenario.index()]),
        })
        .collect();

    let tariff_first = records
        .iter()
        .filter(|r| r.equilibrium.player_a == Move::Tariff)
        .count();

    RunStatistics {
        trials: result.trials,
        successful: result.successful(),
        failed: result.failed(),
        success_rate: result.success_rate_label(),
        scenarios,
        outcomes,
        first_move_tariff_rate: share(tariff_first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{BackwardInduction, EquilibriumSolver};
    use crate::simulation::engine::TrialFailure;
    use crate::types::{outcome_list, PayoffPair, ScenarioPayoffs};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn record(trial: usize, nt_nt: (f64, f64), t_t: (f64, f64)) -> TrialRecord {
        let mut payoffs = ScenarioPayoffs::new();
        payoffs.insert(Scenario::NtNt, PayoffPair::new(nt_nt.0, nt_nt.1));
        payoffs.insert(Scenario::TNt, PayoffPair::new(0.0, 0.0));
        payoffs.insert(Scenario::NtT, PayoffPair::new(0.0, 0.0));
        payoffs.insert(Scenario::TT, PayoffPair::new(t_t.0, t_t.1));
        let equilibrium = BackwardInduction
            .solve(&outcome_list(&payoffs).unwrap())
            .unwrap();
        TrialRecord {
            trial,
            payoffs,
            samples: BTreeMap::new(),
            equilibrium,
        }
    }

    #[test]
    fn test_aggregate_statistics() {
        let result = AggregateResult {
            trials: 3,
            // trial 0: NT_NT dominant; trial 2: T_T dominant
            records: vec![record(0, (4.0, 4.0), (1.0, 1.0)), record(2, (2.0, 2.0), (6.0, 6.0))],
            failures: vec![TrialFailure {
                trial: 1,
                kind: "EvaluationFailed".into(),
                message: "division by zero".into(),
            }],
            elapsed: Duration::ZERO,
        };
        let stats = aggregate_statistics(&result);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_rate, "66.67%");

        let nt_nt = &stats.scenarios[0];
        assert_eq!(nt_nt.scenario, Scenario::NtNt);
        assert_eq!(nt_nt.player_a.mean, 3.0);
        assert_eq!(nt_nt.player_a.std_dev, 1.0);
        assert_eq!(nt_nt.player_a.min, 2.0);
        assert_eq!(nt_nt.player_a.max, 4.0);

        assert_eq!(stats.outcomes[Scenario::NtNt.index()].count, 1);
        assert_eq!(stats.outcomes[Scenario::TT.index()].count, 1);
        assert_eq!(stats.outcomes[Scenario::TT.index()].share, 0.5);
        assert_eq!(stats.first_move_tariff_rate, 0.5);
    }

    #[test]
    fn test_empty_result() {
        let result = AggregateResult {
            trials: 0,
            records: Vec::new(),
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        };
        let stats = aggregate_statistics(&result);
        assert_eq!(stats.success_rate, "0%");
        assert!(stats.outcomes.iter().all(|o| o.count == 0 && o.share == 0.0));
        assert_eq!(stats.scenarios[3].player_b.mean, 0.0);
    }
}

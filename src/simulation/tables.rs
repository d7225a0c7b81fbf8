//! Result aggregator: reshape trial records into export tables.
//!
//! | Table | Columns (after `trial`) |
//! |-------|-------------------------|
//! | player A variables | `<scenario>_<id>` for every scenario × A variable |
//! | player B variables | `<scenario>_<id>` for every scenario × B variable |
//! | payoffs | `<scenario>_A`, `<scenario>_B` for every scenario, then `equilibrium` |
//!
//! One row per successful trial, in trial order. Failed trials are carried
//! separately in `failures`.

use serde::Serialize;

use crate::types::{PlayerSpec, PlayerTag, Scenario};

use super::engine::{AggregateResult, TrialFailure};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableRow {
    pub trial: usize,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableTable {
    pub player: PlayerTag,
    pub columns: Vec<String>,
    pub rows: Vec<VariableRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffRow {
    pub trial: usize,
    pub payoffs: Vec<f64>,
    pub equilibrium: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffTable {
    pub columns: Vec<String>,
    pub rows: Vec<PayoffRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTables {
    pub player_a: VariableTable,
    pub player_b: VariableTable,
    pub payoffs: PayoffTable,
    pub failures: Vec<TrialFailure>,
}

fn variable_table(result: &AggregateResult, spec: &PlayerSpec, player: PlayerTag) -> VariableTable {
    let columns = Scenario::ALL
        .iter()
        .flat_map(|s| spec.variables.iter().map(move |v| format!("{}_{}", s, v.id)))
        .collect();

    let rows = result
        .records
        .iter()
        .map(|r| VariableRow {
            trial: r.trial,
            values: r
                .samples
                .values()
                .flat_map(|s| match player {
                    PlayerTag::A => s.player_a.iter(),
                    PlayerTag::B => s.player_b.iter(),
                })
                .copied()
                .collect(),
        })
        .collect();

    VariableTable {
        player,
        columns,
        rows,
    }
}

fn payoff_table(result: &AggregateResult) -> PayoffTable {
    let columns = Scenario::ALL
        .iter()
        .flat_map(|s| [format!("{}_A", s), format!("{}_B", s)])
        .chain(std::iter::once("equilibrium".to_string()))
        .collect();

    let rows = result
        .records
        .iter()
        .map(|r| PayoffRow {
            trial: r.trial,
            payoffs: r.payoffs.values().flat_map(|p| [p.a, p.b]).collect(),
            equilibrium: r.equilibrium.to_string(),
        })
        .collect();

    PayoffTable { columns, rows }
}

pub fn build_tables(
    result: &AggregateResult,
    player_a: &PlayerSpec,
    player_b: &PlayerSpec,
) -> ResultTables {
    ResultTables {
        player_a: variable_table(result, player_a, PlayerTag::A),
        player_b: variable_table(result, player_b, PlayerTag::B),
        payoffs: payoff_table(result),
        failures: result.failures.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::simulation::engine::run;
    use crate::types::VariableDefinition;

    fn player(formula: &str, ids: &[&str]) -> PlayerSpec {
        PlayerSpec {
            formula: formula.into(),
            variables: ids
                .iter()
                .map(|id| VariableDefinition::new(id, -100.0, 100.0, 0.0))
                .collect(),
            scenarios: vec!["NT_NT".into(), "T_NT".into(), "NT_T".into(), "T_T".into()],
            scenario_values: (0..4)
                .map(|row| (0..ids.len()).map(|col| (row * 10 + col) as f64).collect())
                .collect(),
        }
    }

    #[test]
    fn test_tables_shape_and_order() {
        let a = player("x + y", &["x", "y"]);
        let b = player("z * 2", &["z"]);
        let cfg = SimulationConfig::default().with_trials(5);
        let result = run(&a, &b, &cfg).unwrap();
        let tables = build_tables(&result, &a, &b);

        assert_eq!(
            tables.player_a.columns,
            vec![
                "NT_NT_x", "NT_NT_y", "T_NT_x", "T_NT_y", "NT_T_x", "NT_T_y", "T_T_x", "T_T_y"
            ]
        );
        assert_eq!(tables.player_b.columns, vec!["NT_NT_z", "T_NT_z", "NT_T_z", "T_T_z"]);
        assert_eq!(tables.payoffs.columns.len(), 9);
        assert_eq!(tables.payoffs.columns[8], "equilibrium");

        let trials: Vec<usize> = tables.payoffs.rows.iter().map(|r| r.trial).collect();
        assert_eq!(trials, vec![0, 1, 2, 3, 4]);

        let row = &tables.player_a.rows[0];
        assert_eq!(row.values, vec![0.0, 1.0, 10.0, 11.0, 20.0, 21.0, 30.0, 31.0]);
        assert_eq!(tables.player_b.rows[0].values, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(
            tables.payoffs.rows[0].payoffs,
            vec![1.0, 0.0, 21.0, 20.0, 41.0, 40.0, 61.0, 60.0]
        );
        assert!(tables.failures.is_empty());
    }

    #[test]
    fn test_failed_trials_absent_from_tables_but_logged() {
        let mut a = player("x / z", &["x", "z"]);
        let b = player("w", &["w"]);
        // z is drawn with zero noise around 0 in every scenario.
        for row in &mut a.scenario_values {
            row[1] = 0.0;
        }
        let cfg = SimulationConfig::default().with_trials(3).sequential();
        let result = run(&a, &b, &cfg).unwrap();
        let tables = build_tables(&result, &a, &b);
        assert!(tables.payoffs.rows.is_empty());
        assert!(tables.player_a.rows.is_empty());
        assert_eq!(tables.failures.len(), 3);
        assert_eq!(
            tables.failures.iter().map(|f| f.trial).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(tables.failures.iter().all(|f| f.kind == "EvaluationFailed"));
    }
}

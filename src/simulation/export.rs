//! CSV/JSON export of result tables.
//!
//! Writes one sheet per table into an output directory:
//! `player_a_variables.csv`, `player_b_variables.csv`, `payoffs.csv`, and
//! `failures.csv` (always written, possibly header-only).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::ExportError;

use super::tables::{PayoffTable, ResultTables, VariableTable};

pub const PLAYER_A_SHEET: &str = "player_a_variables.csv";
pub const PLAYER_B_SHEET: &str = "player_b_variables.csv";
pub const PAYOFF_SHEET: &str = "payoffs.csv";
pub const FAILURE_SHEET: &str = "failures.csv";

fn write_variable_sheet(path: &Path, table: &VariableTable) -> Result<(), ExportError> {
    let mut w = csv::Writer::from_path(path)?;
    let mut header = vec!["trial".to_string()];
    header.extend(table.columns.iter().cloned());
    w.write_record(&header)?;
    for row in &table.rows {
        let mut record = vec![row.trial.to_string()];
        record.extend(row.values.iter().map(|v| v.to_string()));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

fn write_payoff_sheet(path: &Path, table: &PayoffTable) -> Result<(), ExportError> {
    let mut w = csv::Writer::from_path(path)?;
    let mut header = vec!["trial".to_string()];
    header.extend(table.columns.iter().cloned());
    w.write_record(&header)?;
    for row in &table.rows {
        let mut record = vec![row.trial.to_string()];
        record.extend(row.payoffs.iter().map(|v| v.to_string()));
        record.push(row.equilibrium.clone());
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

fn write_failure_sheet(path: &Path, tables: &ResultTables) -> Result<(), ExportError> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["trial", "kind", "message"])?;
    for f in &tables.failures {
        w.write_record([f.trial.to_string(), f.kind.clone(), f.message.clone()])?;
    }
    w.flush()?;
    Ok(())
}

/// Write all sheets into `dir` (created if missing). Returns the written paths.
pub fn save_tables(dir: &Path, tables: &ResultTables) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir)?;
    let paths = [
        dir.join(PLAYER_A_SHEET),
        dir.join(PLAYER_B_SHEET),
        dir.join(PAYOFF_SHEET),
        dir.join(FAILURE_SHEET),
    ];
    write_variable_sheet(&paths[0], &tables.player_a)?;
    write_variable_sheet(&paths[1], &tables.player_b)?;
    write_payoff_sheet(&paths[2], &tables.payoffs)?;
    write_failure_sheet(&paths[3], tables)?;
    info!(dir = %dir.display(), rows = tables.payoffs.rows.len(), "exported result tables");
    Ok(paths.to_vec())
}

/// Pretty-print any serializable value to `path`, creating parent directories.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

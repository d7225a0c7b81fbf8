//! Axum HTTP server: run simulations on request.
//!
//! The server is stateless apart from the base [`SimulationConfig`] it was
//! created with; each request overrides `trials` and `seed` if given.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Service banner |
//! | GET | `/health` | Health check |
//! | POST | `/simulate` | Run a simulation for two players, return statistics and tables |

use std::path::Path;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

use crate::config::SimulationConfig;
use crate::error::{ConfigError, SimulationError};
use crate::simulation::{aggregate_statistics, build_tables, run, ResultTables, RunStatistics};
use crate::types::PlayerSpec;

pub type AppState = SimulationConfig;

pub fn create_router(config: SimulationConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health_check))
        .route("/simulate", post(handle_simulate))
        .layer(cors)
        .with_state(config)
}

// ── Request/Response types ──────────────────────────────────────────

/// A simulation request, as posted to `/simulate` or read from a file by the
/// CLI.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub player_a: PlayerSpec,
    pub player_b: PlayerSpec,
    /// Free-form context echoed back with the result.
    pub summary: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SimulationRequest {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// `base` with this request's `trials` / `seed` applied.
    pub fn config(&self, base: SimulationConfig) -> SimulationConfig {
        let mut config = base;
        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    pub summary: serde_json::Value,
    pub success_rate: String,
    pub statistics: RunStatistics,
    pub tables: ResultTables,
}

/// Run `request` against `base` and package statistics and tables.
pub fn run_request(
    request: &SimulationRequest,
    base: SimulationConfig,
) -> Result<SimulationResponse, SimulationError> {
    let config = request.config(base);
    let result = run(&request.player_a, &request.player_b, &config)?;
    let statistics = aggregate_statistics(&result);
    Ok(SimulationResponse {
        summary: request.summary.clone(),
        success_rate: statistics.success_rate.clone(),
        statistics,
        tables: build_tables(&result, &request.player_a, &request.player_b),
    })
}

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, msg: &str) -> ErrorResponse {
    (status, Json(serde_json::json!({ "error": msg })))
}

// ── Handlers ────────────────────────────────────────────────────────

async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Tariff game equilibrium estimator",
        "status": "success",
    }))
}

async fn handle_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "message": "API is running",
    }))
}

async fn handle_simulate(
    State(base): State<AppState>,
    payload: Result<Json<SimulationRequest>, JsonRejection>,
) -> Result<Json<SimulationResponse>, ErrorResponse> {
    let Json(request) = payload.map_err(|rejection| {
        let msg = rejection.body_text();
        warn!(error = %msg, "rejected simulate request");
        error_response(StatusCode::BAD_REQUEST, &msg)
    })?;
    if request.summary.is_null() {
        warn!("rejected simulate request: null summary");
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "missing field `summary`",
        ));
    }

    // Trials run on the rayon pool; keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || run_request(&request, base))
        .await
        .map_err(|e| {
            error!(error = %e, "simulation task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "simulation task failed")
        })?;

    outcome.map(Json).map_err(|e| {
        error!(code = e.error_code(), error = %e, "simulation failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
    })
}

//! Shared environment configuration for the tariffgame binaries.
//!
//! Consolidates `TARIFFGAME_PORT` (or `PORT`), `TARIFFGAME_LOG` and
//! `RAYON_NUM_THREADS` reads.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::ConfigError;

pub const LOG_ENV: &str = "TARIFFGAME_LOG";
pub const PORT_ENV: &str = "TARIFFGAME_PORT";
/// Generic port variable set by most hosting platforms.
pub const FALLBACK_PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 9000;
const DEFAULT_LOG_FILTER: &str = "tariffgame=info";

static INIT: Once = Once::new();

/// Install the global tracing subscriber.
///
/// Reads `TARIFFGAME_LOG` (e.g. `tariffgame=debug`), falling back to
/// `tariffgame=info` when unset or invalid. Idempotent.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .with(filter)
            .init();
    });
}

fn thread_count_from_env() -> Option<usize> {
    std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
}

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`) and build the rayon
/// global pool. Without either variable rayon picks its own size.
///
/// Tolerates an already-initialized pool. Returns the effective thread count.
pub fn init_rayon_threads() -> usize {
    if let Some(n) = thread_count_from_env() {
        if rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .is_err()
        {
            info!("rayon pool already initialized");
        }
    }
    let threads = rayon::current_num_threads();
    info!(threads, "rayon threads");
    threads
}

/// Read `TARIFFGAME_PORT`, falling back to `PORT` (default 9000).
pub fn server_port() -> Result<u16, ConfigError> {
    resolve_port(
        std::env::var(PORT_ENV).ok().as_deref(),
        std::env::var(FALLBACK_PORT_ENV).ok().as_deref(),
    )
}

fn resolve_port(primary: Option<&str>, fallback: Option<&str>) -> Result<u16, ConfigError> {
    let (key, raw) = match (primary, fallback) {
        (Some(s), _) => (PORT_ENV, s),
        (None, Some(s)) => (FALLBACK_PORT_ENV, s),
        (None, None) => return Ok(DEFAULT_PORT),
    };
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

use std::process::ExitCode;

use tracing::{error, info};

use tariffgame::config::SimulationConfig;
use tariffgame::env_config::{init_rayon_threads, init_tracing, server_port};
use tariffgame::server::create_router;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let port = match server_port() {
        Ok(port) => port,
        Err(e) => {
            error!(error = %e, "bad server configuration");
            return ExitCode::FAILURE;
        }
    };
    init_rayon_threads();

    let app = create_router(SimulationConfig::default());

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(port, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    println!("Server is running on port {}. Press Ctrl+C to stop.", port);
    info!(port, "listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    println!("\nStopping server...");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install CTRL+C signal handler");
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use tariffgame::config::{SamplingPolicy, SimulationConfig};
use tariffgame::env_config::{init_rayon_threads, init_tracing};
use tariffgame::server::{run_request, SimulationRequest, SimulationResponse};
use tariffgame::simulation::{save_json, save_tables};

/// Estimate the tariff game equilibrium by Monte Carlo simulation.
#[derive(Parser, Debug)]
#[command(name = "tariffgame-simulate", version)]
struct Args {
    /// Request JSON (playerA, playerB, summary, optional trials/seed).
    #[arg(short, long)]
    input: PathBuf,

    /// Number of trials; overrides the request file.
    #[arg(short, long)]
    trials: Option<usize>,

    /// Base seed; overrides the request file.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory for result.json and CSV tables.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run trials on one thread.
    #[arg(long)]
    sequential: bool,

    /// Do not clamp sampled values to variable bounds.
    #[arg(long)]
    no_clamp_samples: bool,

    /// Do not clamp standardized values to [0, 1].
    #[arg(long)]
    no_clamp_standardized: bool,
}

impl Args {
    fn base_config(&self) -> SimulationConfig {
        SimulationConfig {
            parallel: !self.sequential,
            sampling: SamplingPolicy {
                clamp_samples: !self.no_clamp_samples,
                clamp_standardized: !self.no_clamp_standardized,
            },
            ..SimulationConfig::default()
        }
    }
}

fn print_summary(response: &SimulationResponse, elapsed_secs: f64) {
    let stats = &response.statistics;
    println!(
        "\nTrials: {} ({} ok, {} failed, success rate {}) in {:.2}s",
        stats.trials, stats.successful, stats.failed, stats.success_rate, elapsed_secs
    );

    println!("\n  {:<6} {:>12} {:>12} {:>12} {:>12}", "", "mean A", "sd A", "mean B", "sd B");
    for s in &stats.scenarios {
        println!(
            "  {:<6} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            s.scenario.label(),
            s.player_a.mean,
            s.player_a.std_dev,
            s.player_b.mean,
            s.player_b.std_dev
        );
    }

    println!("\n  Equilibrium outcomes:");
    for o in &stats.outcomes {
        println!(
            "  {:<6} {:>8} ({:.1}%)",
            o.scenario.label(),
            o.count,
            o.share * 100.0
        );
    }
    println!(
        "  A opens with a tariff in {:.1}% of trials",
        stats.first_move_tariff_rate * 100.0
    );

    for f in response.tables.failures.iter().take(5) {
        println!("  trial {} failed [{}]: {}", f.trial, f.kind, f.message);
    }
    if response.tables.failures.len() > 5 {
        println!("  ... {} more failures", response.tables.failures.len() - 5);
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    init_rayon_threads();

    let mut request = match SimulationRequest::from_file(&args.input) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if args.trials.is_some() {
        request.trials = args.trials;
    }
    if args.seed.is_some() {
        request.seed = args.seed;
    }

    let start = Instant::now();
    let response = match run_request(&request, args.base_config()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e);
            return ExitCode::FAILURE;
        }
    };
    print_summary(&response, start.elapsed().as_secs_f64());

    if let Some(dir) = &args.output {
        let written = save_json(&dir.join("result.json"), &response)
            .and_then(|_| save_tables(dir, &response.tables));
        match written {
            Ok(paths) => {
                println!("\nWrote {}", dir.join("result.json").display());
                for p in paths {
                    println!("Wrote {}", p.display());
                }
            }
            Err(e) => {
                eprintln!("Error writing output: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

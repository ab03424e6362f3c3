use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use signal_core::results::SimulationResult;
use signal_core::runner::{RunOptions, StopSignal};
use signal_core::scenario::ScenarioParams;
use signal_core::strategy::StrategyKind;
use signal_experiments::{
    compare_strategies, export_comparison_to_csv, export_result_to_json, export_to_json,
    run_with_options,
};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "signal_sim",
    about = "Two-phase traffic signal controller simulation",
    long_about = "Simulates a four-way intersection driven by a two-phase signal\n\
                  under a fixed, proportional, Webster or adaptive timing strategy."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one strategy and print a summary
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Timing strategy (fixed, proportional, webster, adaptive)
        #[arg(long, env = "SIGNAL_SIM_STRATEGY")]
        strategy: Option<String>,
        /// Sleep between ticks, in milliseconds
        #[arg(long)]
        tick_delay_ms: Option<u64>,
        /// Log a status line after every tick
        #[arg(long)]
        watch: bool,
        /// Output JSON file (default: results/result_<strategy>_<unix secs>.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run every strategy on the same seed and compare them
    Compare {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Worker threads (default: one per core)
        #[arg(long)]
        threads: Option<usize>,
        /// Write every result to this JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write the comparison table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

/// Scenario flags shared by every subcommand. Flags override `--config`.
#[derive(Args)]
struct ScenarioArgs {
    /// JSON file holding serialized scenario parameters
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated seconds to run
    #[arg(long)]
    duration: Option<u64>,
    /// Seconds between traffic snapshots
    #[arg(long)]
    update_interval: Option<u64>,
    /// Disable random traffic incidents
    #[arg(long)]
    no_events: bool,
    /// Random seed
    #[arg(long, env = "SIGNAL_SIM_SEED")]
    seed: Option<u64>,
    /// Blend moving-average predictions into the adaptive strategy
    #[arg(long)]
    predictor: bool,
}

impl ScenarioArgs {
    fn params(&self) -> Result<ScenarioParams, String> {
        let mut params = match &self.config {
            Some(path) => load_params(path)?,
            None => ScenarioParams::default(),
        };
        if let Some(duration) = self.duration {
            params = params.with_duration_secs(duration);
        }
        if let Some(interval) = self.update_interval {
            params = params.with_update_interval_secs(interval);
        }
        if self.no_events {
            params = params.with_incidents(false);
        }
        if let Some(seed) = self.seed {
            params = params.with_seed(seed);
        }
        if self.predictor {
            params = params.with_predictor(true);
        }
        Ok(params)
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn load_params(path: &Path) -> Result<ScenarioParams, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|error| format!("Failed to read {}: {error}", path.display()))?;
    serde_json::from_str(&text).map_err(|error| format!("Invalid config {}: {error}", path.display()))
}

fn default_output(strategy: StrategyKind) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    PathBuf::from("results").join(format!("result_{}_{secs}.json", strategy.name()))
}

fn print_summary(result: &SimulationResult) {
    let rule = "=".repeat(40);
    println!("\n{rule}");
    println!(
        "SIMULATION SUMMARY - {} STRATEGY",
        result.strategy_name.to_uppercase()
    );
    println!("{rule}");
    println!("Total simulation time: {} seconds", result.total_elapsed_ticks);
    println!("Total vehicles processed: {}", result.processed_vehicles);
    println!("Average wait time: {:.2} seconds", result.average_wait_time);
    println!("Throughput: {:.2} vehicles/minute", result.throughput);
    println!("Final vehicle counts:");
    for (direction, count) in result.final_queue_state.iter() {
        println!("  {}: {count}", direction.name());
    }
    println!("Phase changes: {}", result.phase_history.len());
    println!("{rule}");
}

/// Sets `stop` on the first Ctrl-C. The current tick always completes.
fn spawn_interrupt_handler(stop: StopSignal) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::warn!("Interrupt received, finishing the current tick");
                stop.stop();
            }
            Err(error) => log::warn!("Cannot listen for Ctrl-C: {error}"),
        }
    });
}

// ── commands ───────────────────────────────────────────────────────

async fn run_command(
    mut params: ScenarioParams,
    strategy: Option<String>,
    tick_delay_ms: Option<u64>,
    watch: bool,
    output: Option<PathBuf>,
) -> Result<(), String> {
    if let Some(name) = strategy {
        params = params.with_strategy_name(&name);
    }
    let output = output.unwrap_or_else(|| default_output(params.strategy));

    let options = RunOptions {
        tick_delay: tick_delay_ms.map(Duration::from_millis),
        stop: StopSignal::new(),
    };
    spawn_interrupt_handler(options.stop.clone());

    let result = tokio::task::spawn_blocking(move || {
        run_with_options(&params, &options, |view| {
            if watch {
                log::info!("{}", view.status_line());
            }
        })
    })
    .await
    .map_err(|error| format!("Simulation task failed: {error}"))??;

    if result.interrupted {
        println!(
            "\nSimulation interrupted after {} ticks",
            result.total_elapsed_ticks
        );
    }
    print_summary(&result);

    export_result_to_json(&result, &output)
        .map_err(|error| format!("Failed to write {}: {error}", output.display()))?;
    println!("Results saved to {}", output.display());
    Ok(())
}

async fn compare_command(
    params: ScenarioParams,
    threads: Option<usize>,
    output: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<(), String> {
    println!(
        "\nRunning comparison of all strategies ({}s each)...\n",
        params.duration_secs
    );
    let comparison = tokio::task::spawn_blocking(move || compare_strategies(&params, threads))
        .await
        .map_err(|error| format!("Comparison task failed: {error}"))??;

    println!("{}", comparison.table());

    if let Some(path) = output {
        export_to_json(&comparison.results, &path)
            .map_err(|error| format!("Failed to write {}: {error}", path.display()))?;
        println!("Results saved to {}", path.display());
    }
    if let Some(path) = csv {
        export_comparison_to_csv(&comparison, &path)
            .map_err(|error| format!("Failed to write {}: {error}", path.display()))?;
        println!("Comparison saved to {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run {
            scenario,
            strategy,
            tick_delay_ms,
            watch,
            output,
        } => match scenario.params() {
            Ok(params) => run_command(params, strategy, tick_delay_ms, watch, output).await,
            Err(error) => Err(error),
        },
        Commands::Compare {
            scenario,
            threads,
            output,
            csv,
        } => match scenario.params() {
            Ok(params) => compare_command(params, threads, output, csv).await,
            Err(error) => Err(error),
        },
    };

    if let Err(error) = outcome {
        log::error!("{error}");
        exit(1);
    }
}

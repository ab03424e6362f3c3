use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the traffic signal simulation workspace",
    long_about = "A unified CLI for running simulations, strategy comparisons,\n\
                  benchmarks, and CI checks in the traffic signal workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one strategy through the signal_sim binary
    Run {
        /// Timing strategy
        #[arg(value_enum, long, default_value_t = Strategy::Proportional)]
        strategy: Strategy,
        /// Simulated seconds
        #[arg(long, default_value_t = 300)]
        duration: u64,
        /// Disable random traffic incidents
        #[arg(long)]
        no_events: bool,
    },
    /// Compare all four strategies on the same seed
    Compare {
        /// Simulated seconds per strategy
        #[arg(long, default_value_t = 3600)]
        duration: u64,
        /// Write the comparison table to this CSV file
        #[arg(long)]
        csv: Option<String>,
    },
    /// Run the one-hour scenario example for every strategy
    Scenario,
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, examples, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Run load tests (ignored tests in signal_core)
    LoadTest,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Fixed,
    Proportional,
    Webster,
    Adaptive,
}

impl Strategy {
    fn name(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Proportional => "proportional",
            Self::Webster => "webster",
            Self::Adaptive => "adaptive",
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and run example scenarios
    Examples,
    /// Run benchmarks
    Bench,
    /// Run check + examples + bench
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn spawn(program: &str, args: &[&str]) -> ExitStatus {
    eprintln!("+ {program} {}", args.join(" "));
    match Command::new(program).args(args).status() {
        Ok(status) => status,
        Err(error) => {
            eprintln!("failed to execute {program}: {error}");
            exit(1);
        }
    }
}

fn run_checked(program: &str, args: &[&str]) {
    let status = spawn(program, args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_cargo(args: &[&str]) {
    run_checked("cargo", args);
}

fn run_git(args: &[&str]) {
    run_checked("git", args);
}

fn bench(extra: &[&str]) {
    let mut args = vec!["bench", "--package", "signal_core", "--bench", "performance"];
    if !extra.is_empty() {
        args.push("--");
        args.extend_from_slice(extra);
    }
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test signal_core");
    run_cargo(&["test", "-p", "signal_core"]);

    step("Test signal_experiments");
    run_cargo(&["test", "-p", "signal_experiments"]);
}

fn ci_examples() {
    step("Run scenario_run (one hour, every strategy)");
    run_cargo(&[
        "run",
        "-p",
        "signal_core",
        "--example",
        "scenario_run",
        "--release",
    ]);

    step("Run strategy_comparison (three seeds)");
    run_cargo(&[
        "run",
        "-p",
        "signal_experiments",
        "--example",
        "strategy_comparison",
        "--release",
    ]);
}

fn ci_bench() {
    step("Run benchmarks");
    bench(&[]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            strategy,
            duration,
            no_events,
        } => {
            let duration = duration.to_string();
            let mut args = vec![
                "run",
                "-p",
                "signal_experiments",
                "--bin",
                "signal_sim",
                "--release",
                "--",
                "run",
                "--strategy",
                strategy.name(),
                "--duration",
                &duration,
            ];
            if no_events {
                args.push("--no-events");
            }
            run_cargo(&args);
        }
        Commands::Compare { duration, csv } => {
            let duration = duration.to_string();
            let mut args = vec![
                "run",
                "-p",
                "signal_experiments",
                "--bin",
                "signal_sim",
                "--release",
                "--",
                "compare",
                "--duration",
                &duration,
            ];
            if let Some(path) = csv.as_deref() {
                args.extend_from_slice(&["--csv", path]);
            }
            run_cargo(&args);
        }
        Commands::Scenario => {
            run_cargo(&[
                "run",
                "-p",
                "signal_core",
                "--example",
                "scenario_run",
                "--release",
            ]);
        }
        Commands::Bench => bench(&[]),
        Commands::BenchCompare => {
            let baseline_dir = Path::new("target/criterion");
            if baseline_dir.exists() {
                step("Removing existing benchmark data");
                if let Err(error) = std::fs::remove_dir_all(baseline_dir) {
                    eprintln!("failed to remove target/criterion: {error}");
                    exit(1);
                }
            }

            step("Stashing current changes");
            run_git(&[
                "stash",
                "push",
                "-m",
                "Temporary stash for benchmark comparison",
            ]);

            step("Running benchmark to create baseline");
            bench(&["--save-baseline", "main"]);

            step("Reapplying changes");
            run_git(&["stash", "pop"]);

            step("Running benchmark comparing against baseline");
            bench(&["--baseline", "main"]);

            eprintln!("\nDone! Check the output above to see performance comparison.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Examples => ci_examples(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_examples();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LoadTest => {
            run_cargo(&[
                "test",
                "-p",
                "signal_core",
                "--test",
                "load_tests",
                "--",
                "--ignored",
            ]);
        }
    }
}

//! Example: compare the four timing strategies across several seeds.
//!
//! Runs every strategy on the same seeds in parallel, prints the per-seed
//! comparison tables and the mean wait per strategy, and exports the last
//! comparison to CSV.
//!
//! Run with: cargo run -p signal_experiments --example strategy_comparison

use signal_core::incidents::IncidentConfig;
use signal_core::scenario::ScenarioParams;
use signal_core::strategy::StrategyKind;
use signal_experiments::{compare_strategies, export_comparison_to_csv};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const SEEDS: [u64; 3] = [1, 2, 3];
    const DURATION_SECS: u64 = 2 * 3600;

    let mut mean_wait = [0.0_f64; 4];
    let mut last = None;

    for seed in SEEDS {
        let params = ScenarioParams::default()
            .with_seed(seed)
            .with_duration_secs(DURATION_SECS)
            .with_incident_config(IncidentConfig {
                ambient_probability: 0.02,
                ..IncidentConfig::default()
            });
        let comparison = compare_strategies(&params, None)?;
        println!("\nSeed {seed}\n{}", comparison.table());

        for (slot, result) in mean_wait.iter_mut().zip(&comparison.results) {
            *slot += result.average_wait_time / SEEDS.len() as f64;
        }
        last = Some(comparison);
    }

    println!("\nMean wait over {} seeds:", SEEDS.len());
    for (kind, wait) in StrategyKind::ALL.iter().zip(mean_wait) {
        println!("  {:<12} {wait:.2}s", kind.name());
    }

    if let Some(comparison) = last {
        export_comparison_to_csv(&comparison, "strategy_comparison.csv")?;
        println!("\nExported strategy_comparison.csv");
    }
    Ok(())
}

//! Run one hour of commuter traffic under each strategy and print the signal timeline.
//!
//! Run with: cargo run -p signal_core --example scenario_run

use bevy_ecs::prelude::World;
use signal_core::results::extract_result;
use signal_core::runner::{initialize_simulation, run_ticks, tick_schedule};
use signal_core::scenario::{build_scenario, ScenarioParams};
use signal_core::strategy::StrategyKind;

fn main() {
    const DURATION_SECS: u64 = 3600;
    const SAMPLE: usize = 12;

    for kind in StrategyKind::ALL {
        let mut world = World::new();
        build_scenario(
            &mut world,
            ScenarioParams::default()
                .with_seed(123)
                .with_strategy(kind)
                .with_duration_secs(DURATION_SECS)
                // 08:00 UTC on a Wednesday, inside the morning peak.
                .with_epoch_ms(1_704_268_800_000),
        );
        initialize_simulation(&mut world);
        let mut schedule = tick_schedule();
        let ticks = run_ticks(&mut world, &mut schedule, u64::MAX);

        let result = match extract_result(&world, false) {
            Ok(result) => result,
            Err(err) => {
                eprintln!("{kind}: {err}");
                continue;
            }
        };

        println!("--- {} ({ticks} ticks, seed 123) ---", result.strategy.name);
        println!("Processed vehicles: {}", result.processed_vehicles);
        println!("Average wait time: {:.2} s", result.average_wait_time);
        println!("Throughput: {:.2} vehicles/min", result.throughput);
        println!("Incidents: {}", result.incidents.len());

        println!("\nFirst {SAMPLE} phase intervals:");
        for r in result.phase_history.iter().take(SAMPLE) {
            println!(
                "  t={:>5}  {:<11} {:<6} {:>3} s  queues N/S/E/W={}/{}/{}/{}",
                r.timestamp,
                r.phase.name(),
                r.state.name(),
                r.duration,
                r.vehicle_counts.north,
                r.vehicle_counts.south,
                r.vehicle_counts.east,
                r.vehicle_counts.west,
            );
        }
        if result.phase_history.len() > SAMPLE {
            println!("  ... and {} more", result.phase_history.len() - SAMPLE);
        }
        println!();
    }
}

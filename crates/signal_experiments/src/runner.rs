//! Simulation execution: one run at a time, or many in parallel with rayon.

use bevy_ecs::prelude::World;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use signal_core::results::{extract_result, SimulationResult};
use signal_core::runner::{initialize_simulation, run_simulation, tick_schedule, RunOptions};
use signal_core::scenario::{build_scenario, ScenarioParams};
use signal_core::strategy::StrategyKind;
use signal_core::telemetry::SignalView;

use crate::metrics::StrategyComparison;

/// Build a world for `params`, run it to the end and extract the result.
pub fn run_single_simulation(params: &ScenarioParams) -> Result<SimulationResult, String> {
    run_with_options(params, &RunOptions::default(), |_| {})
}

/// Like [run_single_simulation], with pacing, cancellation and a per-tick observer.
///
/// An interrupted run still yields a result, flagged `interrupted`.
pub fn run_with_options<F>(
    params: &ScenarioParams,
    options: &RunOptions,
    observer: F,
) -> Result<SimulationResult, String>
where
    F: FnMut(&SignalView),
{
    let mut world = World::new();
    build_scenario(&mut world, params.clone());
    initialize_simulation(&mut world);

    let mut schedule = tick_schedule();
    let outcome = run_simulation(&mut world, &mut schedule, options, observer);

    extract_result(&world, outcome.interrupted).map_err(|error| error.to_string())
}

fn progress_bar(total: usize) -> Result<ProgressBar, String> {
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .map_err(|error| format!("Invalid progress template: {error}"))?
        .progress_chars("#>-");
    let bar = ProgressBar::new(total as u64);
    bar.set_style(style);
    Ok(bar)
}

/// Run every parameter set in parallel. Results keep the input order.
///
/// `num_threads` of `None` uses rayon's default pool size.
pub fn run_parallel(
    parameter_sets: &[ScenarioParams],
    num_threads: Option<usize>,
    show_progress: bool,
) -> Result<Vec<SimulationResult>, String> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        Some(progress_bar(total)?)
    } else {
        None
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder
        .build()
        .map_err(|error| format!("Failed to create thread pool: {error}"))?;

    let results = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|params| {
                let result = run_single_simulation(params);
                if let Some(progress_bar) = &pb {
                    progress_bar.inc(1);
                }
                result
            })
            .collect::<Result<Vec<_>, String>>()
    });

    if let Some(progress_bar) = &pb {
        progress_bar.finish_with_message("Completed");
    }
    results
}

/// Run all four strategies on the same seed and traffic, in parallel.
pub fn compare_strategies(
    params: &ScenarioParams,
    num_threads: Option<usize>,
) -> Result<StrategyComparison, String> {
    let parameter_sets: Vec<ScenarioParams> = StrategyKind::ALL
        .iter()
        .map(|kind| params.clone().with_strategy(*kind))
        .collect();
    log::info!(
        "Comparing {} strategies over {}s (seed {})",
        parameter_sets.len(),
        params.duration_secs,
        params.seed
    );
    let results = run_parallel(&parameter_sets, num_threads, true)?;
    Ok(StrategyComparison::new(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_core::runner::StopSignal;

    fn short_params() -> ScenarioParams {
        ScenarioParams::default()
            .with_seed(3)
            .with_duration_secs(240)
    }

    #[test]
    fn test_single_simulation() {
        let result = run_single_simulation(&short_params()).unwrap();
        assert_eq!(result.total_elapsed_ticks, 240);
        assert!(!result.interrupted);
        assert!(!result.phase_history.is_empty());
    }

    #[test]
    fn test_stopped_run_is_flagged_interrupted() {
        let options = RunOptions::default();
        options.stop.stop();
        let result = run_with_options(&short_params(), &options, |_| {}).unwrap();
        assert!(result.interrupted);
        assert_eq!(result.total_elapsed_ticks, 0);
    }

    #[test]
    fn test_stop_from_observer() {
        let stop = StopSignal::new();
        let options = RunOptions {
            tick_delay: None,
            stop: stop.clone(),
        };
        let result = run_with_options(&short_params(), &options, |view| {
            if view.elapsed_ticks == 50 {
                stop.stop();
            }
        })
        .unwrap();
        assert!(result.interrupted);
        assert_eq!(result.total_elapsed_ticks, 50);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sets: Vec<ScenarioParams> = (0..4).map(|seed| short_params().with_seed(seed)).collect();
        let parallel = run_parallel(&sets, Some(2), false).unwrap();
        assert_eq!(parallel.len(), 4);
        for (params, result) in sets.iter().zip(&parallel) {
            assert_eq!(&run_single_simulation(params).unwrap(), result);
        }
    }

    #[test]
    fn test_compare_covers_every_strategy() {
        let comparison = compare_strategies(&short_params(), Some(2)).unwrap();
        let names: Vec<&str> = comparison
            .results
            .iter()
            .map(|r| r.strategy_name.as_str())
            .collect();
        assert_eq!(names, ["fixed", "proportional", "webster", "adaptive"]);
    }
}

//! Run-level wrapper around `signal_core`: single runs, strategy comparison and export.
//!
//! # Quick Start
//!
//! ```no_run
//! use signal_core::scenario::ScenarioParams;
//! use signal_experiments::{compare_strategies, export_to_json};
//!
//! let params = ScenarioParams::default().with_seed(7).with_duration_secs(1_800);
//! let comparison = compare_strategies(&params, None).unwrap();
//! println!("{}", comparison.table());
//! export_to_json(&comparison.results, "comparison.json").unwrap();
//! ```
//!
//! # Architecture
//!
//! - [`runner`]: single and parallel simulation execution using rayon
//! - [`metrics`]: comparison rows and best-strategy selection
//! - [`export`]: result export to JSON/CSV

pub mod export;
pub mod metrics;
pub mod runner;

pub use export::{export_comparison_to_csv, export_result_to_json, export_to_json};
pub use metrics::{ComparisonRow, StrategyComparison};
pub use runner::{compare_strategies, run_parallel, run_single_simulation, run_with_options};

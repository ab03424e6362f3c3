//! Strategy comparison: one summary row per run, plus the best strategy by
//! throughput and by average wait.

use serde::Serialize;
use signal_core::results::SimulationResult;

/// Flattened view of one run, as written to the comparison table and CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub strategy: String,
    pub total_elapsed_ticks: u64,
    pub processed_vehicles: u64,
    pub average_wait_time: f64,
    /// Vehicles per simulated minute.
    pub throughput: f64,
    pub phase_changes: usize,
    pub final_queue_total: u64,
    pub incidents: usize,
    pub interrupted: bool,
}

impl From<&SimulationResult> for ComparisonRow {
    fn from(result: &SimulationResult) -> Self {
        Self {
            strategy: result.strategy_name.clone(),
            total_elapsed_ticks: result.total_elapsed_ticks,
            processed_vehicles: result.processed_vehicles,
            average_wait_time: result.average_wait_time,
            throughput: result.throughput,
            // The opening green is not a change.
            phase_changes: result.phase_history.len().saturating_sub(1),
            final_queue_total: result.final_queue_state.total(),
            incidents: result.incidents.len(),
            interrupted: result.interrupted,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StrategyComparison {
    pub results: Vec<SimulationResult>,
}

impl StrategyComparison {
    pub fn new(results: Vec<SimulationResult>) -> Self {
        Self { results }
    }

    pub fn rows(&self) -> Vec<ComparisonRow> {
        self.results.iter().map(ComparisonRow::from).collect()
    }

    /// Highest throughput; the first run wins ties.
    pub fn best_throughput(&self) -> Option<&SimulationResult> {
        self.results.iter().reduce(|best, candidate| {
            if candidate.throughput > best.throughput {
                candidate
            } else {
                best
            }
        })
    }

    /// Lowest average wait; the first run wins ties.
    pub fn best_wait_time(&self) -> Option<&SimulationResult> {
        self.results.iter().reduce(|best, candidate| {
            if candidate.average_wait_time < best.average_wait_time {
                candidate
            } else {
                best
            }
        })
    }

    /// Fixed-width table followed by the best-strategy lines.
    pub fn table(&self) -> String {
        let rule = "=".repeat(80);
        let mut out = format!("{rule}\nSTRATEGY COMPARISON RESULTS\n{rule}\n");
        out.push_str(&format!(
            "{:<12} | {:<10} | {:<15} | {:<12}\n{}\n",
            "STRATEGY",
            "PROCESSED",
            "AVG WAIT TIME",
            "THROUGHPUT",
            "-".repeat(80)
        ));
        for row in self.rows() {
            out.push_str(&format!(
                "{:<12} | {:<10} | {:<15} | {:.2}/min\n",
                row.strategy,
                row.processed_vehicles,
                format!("{:.2}s", row.average_wait_time),
                row.throughput
            ));
        }
        out.push_str(&rule);
        out.push('\n');

        if let Some(best) = self.best_throughput() {
            out.push_str(&format!(
                "\nBest throughput: {} strategy ({:.2} vehicles/min)",
                best.strategy_name.to_uppercase(),
                best.throughput
            ));
        }
        if let Some(best) = self.best_wait_time() {
            out.push_str(&format!(
                "\nBest wait time: {} strategy ({:.2} seconds)",
                best.strategy_name.to_uppercase(),
                best.average_wait_time
            ));
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use signal_core::intersection::DirectionCounts;
    use signal_core::strategy::{StrategyConfig, StrategyKind, TimingStrategy};

    pub(crate) fn result(kind: StrategyKind, processed: u64, wait: f64, throughput: f64) -> SimulationResult {
        SimulationResult {
            strategy_name: kind.name().to_string(),
            strategy: TimingStrategy::new(kind, &StrategyConfig::default()).info(),
            total_elapsed_ticks: 300,
            processed_vehicles: processed,
            final_queue_state: DirectionCounts::new(1, 2, 3, 4),
            average_wait_time: wait,
            throughput,
            interrupted: false,
            phase_history: Vec::new(),
            incidents: Vec::new(),
        }
    }

    #[test]
    fn test_best_strategies() {
        let comparison = StrategyComparison::new(vec![
            result(StrategyKind::Fixed, 100, 12.0, 20.0),
            result(StrategyKind::Proportional, 120, 9.5, 24.0),
            result(StrategyKind::Webster, 118, 8.0, 23.6),
            result(StrategyKind::Adaptive, 120, 8.0, 24.0),
        ]);
        assert_eq!(
            comparison.best_throughput().map(|r| r.strategy_name.as_str()),
            Some("proportional")
        );
        assert_eq!(
            comparison.best_wait_time().map(|r| r.strategy_name.as_str()),
            Some("webster")
        );
    }

    #[test]
    fn test_empty_comparison() {
        let comparison = StrategyComparison::default();
        assert!(comparison.best_throughput().is_none());
        assert!(comparison.best_wait_time().is_none());
        assert!(comparison.rows().is_empty());
    }

    #[test]
    fn test_table_layout() {
        let comparison =
            StrategyComparison::new(vec![result(StrategyKind::Webster, 42, 3.25, 8.4)]);
        let table = comparison.table();
        assert!(table.contains("webster      | 42         | 3.25s           | 8.40/min"));
        assert!(table.contains("Best throughput: WEBSTER strategy (8.40 vehicles/min)"));
        assert!(table.contains("Best wait time: WEBSTER strategy (3.25 seconds)"));
    }

    #[test]
    fn test_row_counts() {
        let row = ComparisonRow::from(&result(StrategyKind::Fixed, 5, 1.0, 1.0));
        assert_eq!(row.final_queue_total, 10);
        assert_eq!(row.phase_changes, 0);
    }
}

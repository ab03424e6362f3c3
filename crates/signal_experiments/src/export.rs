//! Result export to JSON and CSV.

use std::path::Path;

use signal_core::results::SimulationResult;

use crate::metrics::StrategyComparison;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export one run (full phase history and incident log) as a pretty-printed JSON object.
///
/// # Errors
///
/// Returns an error if file creation or JSON serialization fails.
pub fn export_result_to_json(
    result: &SimulationResult,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::write_json(result, file)
}

/// Export several runs as a JSON array.
///
/// # Errors
///
/// Returns an error if `results` is empty, or if file creation or JSON serialization fails.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    json::write_json(&results, file)
}

/// Export the comparison table, one row per strategy.
///
/// # Errors
///
/// Returns an error if the comparison is empty, or if file creation or CSV writing fails.
pub fn export_comparison_to_csv(
    comparison: &StrategyComparison,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(&comparison.results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::write_rows(&comparison.rows(), file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::result;
    use signal_core::strategy::StrategyKind;
    use tempfile::NamedTempFile;

    #[test]
    fn test_export_result_to_json_round_trips() {
        let original = result(StrategyKind::Adaptive, 77, 4.5, 15.4);
        let file = NamedTempFile::new().unwrap();
        export_result_to_json(&original, file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("\"strategy_name\": \"adaptive\""));
        assert!(contents.contains("\"final_queue_state\""));
        let parsed: SimulationResult = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_export_to_json_rejects_empty() {
        let file = NamedTempFile::new().unwrap();
        let err = export_to_json(&[], file.path()).unwrap_err();
        assert_eq!(err.to_string(), "No results to export");
    }

    #[test]
    fn test_export_comparison_to_csv() {
        let comparison = StrategyComparison::new(vec![
            result(StrategyKind::Fixed, 100, 12.0, 20.0),
            result(StrategyKind::Webster, 118, 8.0, 23.6),
        ]);
        let file = NamedTempFile::new().unwrap();
        export_comparison_to_csv(&comparison, file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("strategy,total_elapsed_ticks,processed_vehicles"));
        assert!(lines[1].starts_with("fixed,300,100,12.0,20.0"));
        assert!(lines[2].starts_with("webster,300,118,8.0,23.6"));
    }
}

//! Score command handler.
//!
//! Implements the `score` subcommand: score every record in a collection
//! against a rubric and report the aggregate.

use crate::config::{ScoreRunConfig, Validatable};
use crate::pipeline::{
    build_report_config, exit_codes, load_records_with_context, load_rubric_with_context,
    output_report, score_collection, ScoredCollection,
};
use anyhow::{bail, Result};

/// Run the score command, returning the desired exit code.
///
/// The caller is responsible for calling `std::process::exit()` with the
/// returned code when it is non-zero.
#[allow(clippy::needless_pass_by_value)]
pub fn run_score(config: ScoreRunConfig) -> Result<i32> {
    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", messages.join("\n  "));
    }

    let quiet = config.behavior.quiet;
    let rubric = load_rubric_with_context(&config.rubric, quiet)?;
    let parsed = load_records_with_context(&config.records, quiet)?;

    let scored = score_collection(&parsed.records, &rubric, &config, None)?;

    let report_config = build_report_config(&config, &rubric, parsed.failures);
    output_report(&config, &scored, &report_config)?;

    Ok(determine_exit_code(&config, &scored))
}

/// Determine the exit code from the aggregate and the configured gates.
///
/// Unscoreable records take precedence over the score threshold.
fn determine_exit_code(config: &ScoreRunConfig, scored: &ScoredCollection) -> i32 {
    let report = &scored.report;
    if config.behavior.fail_on_unscoreable && report.has_unscoreable() {
        tracing::error!(
            "{} record(s) could not be scored",
            report.unscoreable.len()
        );
        return exit_codes::UNSCOREABLE_RECORDS;
    }
    if let Some(threshold) = config.behavior.min_score {
        let mean = report.mean_percentage();
        if mean < f64::from(threshold) {
            tracing::error!(
                "Mean score {:.1}% is below minimum threshold {:.1}%",
                mean,
                threshold
            );
            return exit_codes::THRESHOLD_NOT_MET;
        }
    }
    exit_codes::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AggregationConfig, BehaviorConfig, OutputConfig, ScoringConfig};
    use crate::reports::ReportFormat;
    use std::path::Path;
    use tempfile::TempDir;

    const RUBRIC: &str = "\
name: demo
rules:
  - field: title
    predicate: { type: non-empty }
  - field: date
    predicate: { type: matches-pattern, pattern: '^\\d{4}$' }
";

    fn setup(records: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("rubric.yaml"), RUBRIC).unwrap();
        std::fs::write(tmp.path().join("maps.jsonl"), records).unwrap();
        tmp
    }

    fn run_config(dir: &Path, behavior: BehaviorConfig) -> ScoreRunConfig {
        ScoreRunConfig {
            records: dir.join("maps.jsonl"),
            rubric: dir.join("rubric.yaml"),
            collection: None,
            scoring: ScoringConfig::default(),
            aggregation: AggregationConfig::default(),
            output: OutputConfig {
                format: ReportFormat::Json,
                file: Some(dir.join("report.json")),
                no_color: true,
            },
            behavior: BehaviorConfig {
                quiet: true,
                ..behavior
            },
        }
    }

    #[test]
    fn test_success_writes_report() {
        let tmp = setup("{\"id\":\"a\",\"fields\":{\"title\":\"Moon\",\"date\":\"1679\"}}\n");
        let code = run_score(run_config(tmp.path(), BehaviorConfig::default())).unwrap();
        assert_eq!(code, exit_codes::SUCCESS);

        let written = std::fs::read_to_string(tmp.path().join("report.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["aggregate"]["collection_id"], "maps");
        assert_eq!(json["metadata"]["rubric_name"], "demo");
    }

    #[test]
    fn test_threshold_not_met() {
        let tmp = setup("{\"id\":\"a\",\"fields\":{\"title\":\"Moon\",\"date\":\"c.1679\"}}\n");
        let behavior = BehaviorConfig {
            min_score: Some(80.0),
            ..BehaviorConfig::default()
        };
        let code = run_score(run_config(tmp.path(), behavior)).unwrap();
        assert_eq!(code, exit_codes::THRESHOLD_NOT_MET);
    }

    #[test]
    fn test_unscoreable_records_gate() {
        let records = "\
{\"id\":\"a\",\"fields\":{\"title\":\"Moon\",\"date\":\"1679\"}}
{\"id\":\"b\",\"fields\":{\"title\":\"Sun\",\"date\":[\"1680\",\"1681\"]}}
";
        let tmp = setup(records);
        let code = run_score(run_config(tmp.path(), BehaviorConfig::default())).unwrap();
        assert_eq!(code, exit_codes::SUCCESS);

        let behavior = BehaviorConfig {
            fail_on_unscoreable: true,
            ..BehaviorConfig::default()
        };
        let code = run_score(run_config(tmp.path(), behavior)).unwrap();
        assert_eq!(code, exit_codes::UNSCOREABLE_RECORDS);
    }

    #[test]
    fn test_all_unscoreable_batch_writes_report() {
        let tmp = setup("{\"id\":\"b\",\"fields\":{\"date\":[\"1680\",\"1681\"]}}\n");
        let behavior = BehaviorConfig {
            fail_on_unscoreable: true,
            ..BehaviorConfig::default()
        };
        let code = run_score(run_config(tmp.path(), behavior)).unwrap();
        assert_eq!(code, exit_codes::UNSCOREABLE_RECORDS);

        let written = std::fs::read_to_string(tmp.path().join("report.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["aggregate"]["record_count"], 0);
        assert_eq!(json["aggregate"]["unscoreable"][0]["record_id"], "b");
        assert_eq!(json["aggregate"]["unscoreable"][0]["error"]["rule_id"], "date");
    }

    #[test]
    fn test_missing_inputs_rejected() {
        let tmp = TempDir::new().unwrap();
        let err = run_score(run_config(tmp.path(), BehaviorConfig::default())).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Record file not found"), "{message}");
        assert!(message.contains("Rubric file not found"), "{message}");
    }
}

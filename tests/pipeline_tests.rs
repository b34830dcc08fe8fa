//! Pipeline and CLI integration tests.
//!
//! These tests exercise the full parse → score → aggregate → report
//! pipeline, error handling paths, and CLI command handlers with real
//! fixture files.

use metaqual::cli::{run_rubric_validate, run_score};
use metaqual::config::{
    AggregationConfig, BehaviorConfig, OutputConfig, ScoreRunConfig, ScoringConfig,
};
use metaqual::parsers::RecordLayout;
use metaqual::pipeline::{
    build_report_config, exit_codes, load_records_with_context, load_rubric_with_context,
    score_collection,
};
use metaqual::reports::{create_reporter_with_options, ReportFormat};
use std::path::{Path, PathBuf};

// ============================================================================
// Test Fixtures
// ============================================================================

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> PathBuf {
    Path::new(FIXTURES_DIR).join(name)
}

fn run_config(records: &str, format: ReportFormat, file: Option<PathBuf>) -> ScoreRunConfig {
    ScoreRunConfig {
        records: fixture_path(records),
        rubric: fixture_path("rubric.yaml"),
        collection: None,
        scoring: ScoringConfig::default(),
        aggregation: AggregationConfig::default(),
        output: OutputConfig {
            format,
            file,
            no_color: true,
        },
        behavior: BehaviorConfig {
            quiet: true,
            ..BehaviorConfig::default()
        },
    }
}

// ============================================================================
// Parse Stage Tests
// ============================================================================

mod parse_stage {
    use super::*;

    #[test]
    fn json_lines_fixture() {
        let parsed = load_records_with_context(&fixture_path("records.jsonl"), true)
            .expect("parse should succeed");
        assert_eq!(parsed.layout, RecordLayout::JsonLines);
        assert_eq!(parsed.records.len(), 5);

        let lines: Vec<usize> = parsed.failures.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![6, 7]);
        assert!(parsed.failures[1].reason.to_string().contains("'r1'"));
    }

    #[test]
    fn json_array_fixture() {
        let parsed = load_records_with_context(&fixture_path("records.json"), true)
            .expect("parse should succeed");
        assert_eq!(parsed.layout, RecordLayout::JsonArray);
        let ids: Vec<&str> = parsed.records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["a1", "a2", "3"]);
        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.failures[0].line, 4);
    }

    #[test]
    fn empty_file_yields_no_records() {
        let parsed = load_records_with_context(&fixture_path("empty.jsonl"), true)
            .expect("empty input is not an ingest error");
        assert!(parsed.records.is_empty());
        assert!(!parsed.has_failures());
    }

    #[test]
    fn rubric_fixture_compiles() {
        let rubric = load_rubric_with_context(&fixture_path("rubric.yaml"), true)
            .expect("valid rubric");
        assert_eq!(rubric.name(), Some("fixture-maps"));
        assert_eq!(rubric.len(), 5);
        assert_eq!(rubric.total_weight(), 6.0);
        assert_eq!(rubric.exclusions().len(), 1);
    }

    #[test]
    fn sample_rubric_compiles() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("rubrics/min-mandatory.yaml");
        let rubric = load_rubric_with_context(&path, true).expect("sample rubric is valid");
        assert_eq!(rubric.name(), Some("min-mandatory"));
        assert!(rubric.rule("date_3").is_some());
    }

    #[test]
    fn sample_rubric_date_shapes() {
        use metaqual::model::{FieldValue, Record};
        use metaqual::quality::score;

        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("rubrics/min-mandatory.yaml");
        let rubric = load_rubric_with_context(&path, true).expect("sample rubric is valid");

        let text = Record::new("text").with_field("date", "1999-04");
        let result = score(&text, &rubric).expect("text date is scoreable");
        assert!(!result.failed_rule("date_3"));

        let listed = Record::new("list").with_field(
            "date",
            FieldValue::List(vec!["1999".to_string(), String::new()]),
        );
        let err = score(&listed, &rubric).unwrap_err();
        assert_eq!(err.rule_id, "date_3");
    }

    #[test]
    fn invalid_rubric_names_the_problem() {
        let err = load_rubric_with_context(&fixture_path("invalid_rubric.yaml"), true)
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("invalid_rubric.yaml"), "{message}");
        assert!(message.contains("date_1"), "{message}");
    }
}

// ============================================================================
// Score Stage Tests
// ============================================================================

mod score_stage {
    use super::*;

    #[test]
    fn fixture_collection_aggregate() {
        let config = run_config("records.jsonl", ReportFormat::Summary, None);
        let rubric = load_rubric_with_context(&config.rubric, true).expect("rubric");
        let parsed = load_records_with_context(&config.records, true).expect("records");

        let scored = score_collection(&parsed.records, &rubric, &config, None).expect("scored");
        let report = &scored.report;

        assert_eq!(report.collection_id, "records");
        assert_eq!(report.record_count, 3);
        assert_eq!(report.excluded_count, 1);
        assert_eq!(report.unscoreable.len(), 1);
        assert_eq!(report.unscoreable[0].record_id, "r4");
        assert_eq!(report.unscoreable[0].error.rule_id, "date_2");

        assert_eq!(report.max_score, 6.0);
        assert_eq!(report.passed_count, 1);
        assert_eq!(report.distribution.median, 4.0);
        assert_eq!(report.distribution.min, 0.0);
        assert_eq!(report.distribution.max, 6.0);

        let rates: Vec<(&str, usize)> = report
            .rule_failures
            .iter()
            .map(|s| (s.rule_id.as_str(), s.failures))
            .collect();
        assert_eq!(
            rates,
            vec![
                ("title_1", 1),
                ("title_2", 2),
                ("date_1", 1),
                ("date_2", 2),
                ("genre_1", 1)
            ]
        );

        let groups: Vec<(&str, f64)> = report
            .group_means
            .iter()
            .map(|g| (g.group.as_str(), g.mean))
            .collect();
        assert_eq!(groups, vec![("title", 0.5), ("date", 0.5)]);
    }

    #[test]
    fn per_record_failures_in_rubric_order() {
        let config = run_config("records.jsonl", ReportFormat::Summary, None);
        let rubric = load_rubric_with_context(&config.rubric, true).expect("rubric");
        let parsed = load_records_with_context(&config.records, true).expect("records");
        let scored = score_collection(&parsed.records, &rubric, &config, None).expect("scored");

        let r2 = scored
            .outcome
            .results
            .iter()
            .find(|r| r.record_id == "r2")
            .expect("r2 scored");
        assert_eq!(r2.score, 4.0);
        assert_eq!(r2.failed, vec!["title_2", "date_2"]);
        assert!(!r2.passed);

        let r3 = scored
            .outcome
            .results
            .iter()
            .find(|r| r.record_id == "r3")
            .expect("r3 scored");
        assert_eq!(r3.score, 0.0);
        assert_eq!(r3.failed.len(), 5);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let mut config = run_config("records.json", ReportFormat::Summary, None);
        let rubric = load_rubric_with_context(&config.rubric, true).expect("rubric");
        let parsed = load_records_with_context(&config.records, true).expect("records");

        let parallel = score_collection(&parsed.records, &rubric, &config, None).expect("scored");
        config.scoring.parallel = false;
        let sequential =
            score_collection(&parsed.records, &rubric, &config, None).expect("scored");

        assert_eq!(parallel.report, sequential.report);
        assert_eq!(parallel.outcome.results, sequential.outcome.results);
    }

    #[test]
    fn empty_collection_needs_allow_empty() {
        let mut config = run_config("empty.jsonl", ReportFormat::Summary, None);
        let rubric = load_rubric_with_context(&config.rubric, true).expect("rubric");

        assert!(score_collection(&[], &rubric, &config, None).is_err());

        config.aggregation.allow_empty = true;
        let scored = score_collection(&[], &rubric, &config, None).expect("allowed");
        assert_eq!(scored.report.record_count, 0);
    }
}

// ============================================================================
// Report Stage Tests
// ============================================================================

mod report_stage {
    use super::*;

    fn render(format: ReportFormat) -> String {
        let config = run_config("records.jsonl", format, None);
        let rubric = load_rubric_with_context(&config.rubric, true).expect("rubric");
        let parsed = load_records_with_context(&config.records, true).expect("records");
        let scored = score_collection(&parsed.records, &rubric, &config, None).expect("scored");
        let report_config = build_report_config(&config, &rubric, parsed.failures);

        create_reporter_with_options(format, false)
            .generate(&scored.report, &scored.outcome.results, &report_config)
            .expect("render")
    }

    #[test]
    fn json_report_carries_everything() {
        let json: serde_json::Value =
            serde_json::from_str(&render(ReportFormat::Json)).expect("valid json");
        assert_eq!(json["metadata"]["rubric_name"], "fixture-maps");
        assert_eq!(json["aggregate"]["record_count"], 3);
        assert_eq!(json["aggregate"]["excluded_count"], 1);
        assert_eq!(json["records"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["ingest_failures"][0]["line"], 6);
    }

    #[test]
    fn csv_report_has_row_per_record() {
        let csv = render(ReportFormat::Csv);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "record_id,title_1,title_2,date_1,date_2,genre_1,group:title,group:date,score,max_score,normalized,grade,passed"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines.contains(&"r1,1,1,1,1,1,1.0000,1.0000,6,6,1.0000,A,true"));
    }

    #[test]
    fn markdown_report_lists_unscoreable() {
        let md = render(ReportFormat::Markdown);
        assert!(md.contains("## Unscoreable Records"));
        assert!(md.contains("| r4 | date\\_2 |") || md.contains("| r4 | date_2 |"));
        assert!(md.contains("| Rejected at ingest | 2 |"));
    }

    #[test]
    fn summary_report_without_color() {
        let summary = render(ReportFormat::Summary);
        assert!(summary.contains("3 scored, 1 unscoreable, 1 excluded, 2 rejected at ingest"));
        assert!(!summary.contains('\x1b'));
    }
}

// ============================================================================
// CLI Handler Tests
// ============================================================================

mod cli_handlers {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn score_writes_requested_file() {
        let tmp = TempDir::new().expect("tempdir");
        let out = tmp.path().join("report.md");
        let config = run_config("records.json", ReportFormat::Markdown, Some(out.clone()));

        let code = run_score(config).expect("run");
        assert_eq!(code, exit_codes::SUCCESS);
        let written = std::fs::read_to_string(out).expect("report written");
        assert!(written.starts_with("# Metadata Quality Report"));
    }

    #[test]
    fn score_min_score_gate() {
        let tmp = TempDir::new().expect("tempdir");
        let mut config = run_config(
            "records.json",
            ReportFormat::Json,
            Some(tmp.path().join("r.json")),
        );
        // Scores 6, 6 and 3 of 6: mean 83.3%.
        config.behavior.min_score = Some(80.0);
        assert_eq!(run_score(config.clone()).expect("run"), exit_codes::SUCCESS);

        config.behavior.min_score = Some(90.0);
        assert_eq!(
            run_score(config).expect("run"),
            exit_codes::THRESHOLD_NOT_MET
        );
    }

    #[test]
    fn score_fail_on_unscoreable() {
        let tmp = TempDir::new().expect("tempdir");
        let mut config = run_config(
            "records.jsonl",
            ReportFormat::Csv,
            Some(tmp.path().join("r.csv")),
        );
        config.behavior.fail_on_unscoreable = true;
        assert_eq!(
            run_score(config).expect("run"),
            exit_codes::UNSCOREABLE_RECORDS
        );
    }

    #[test]
    fn score_missing_rubric_is_error() {
        let mut config = run_config("records.jsonl", ReportFormat::Summary, None);
        config.rubric = fixture_path("does-not-exist.yaml");
        assert!(run_score(config).is_err());
    }

    #[test]
    fn rubric_validate() {
        assert_eq!(
            run_rubric_validate(&fixture_path("rubric.yaml"), true).expect("valid"),
            exit_codes::SUCCESS
        );
        assert!(run_rubric_validate(&fixture_path("invalid_rubric.yaml"), true).is_err());
    }
}

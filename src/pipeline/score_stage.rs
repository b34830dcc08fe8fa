//! Scoring and aggregation stage.

use super::PipelineError;
use crate::config::ScoreRunConfig;
use crate::model::Record;
use crate::quality::{score_batch_with, AggregateReport, Aggregator, BatchOptions, BatchOutcome, Rubric};
use anyhow::Result;
use std::sync::atomic::AtomicBool;

/// A scored collection: the per-record outcome and its aggregate.
#[derive(Debug, Clone)]
pub struct ScoredCollection {
    pub outcome: BatchOutcome,
    pub report: AggregateReport,
}

/// Score every record and aggregate the results.
pub fn score_collection(
    records: &[Record],
    rubric: &Rubric,
    config: &ScoreRunConfig,
    cancel: Option<&AtomicBool>,
) -> Result<ScoredCollection> {
    let collection = config.collection_id();
    if !config.behavior.quiet {
        tracing::info!(
            "Scoring {} record(s) in collection '{}'",
            records.len(),
            collection
        );
    }

    let options = BatchOptions {
        parallel: config.scoring.parallel,
    };
    let outcome = score_batch_with(records, rubric, options, cancel);
    if outcome.was_cancelled() {
        tracing::warn!("Scoring cancelled; {} record(s) skipped", outcome.skipped);
    }

    let report = Aggregator::for_rubric(collection.clone(), rubric)
        .allow_empty(config.aggregation.allow_empty)
        .histogram_buckets(config.aggregation.histogram_buckets)
        .aggregate_outcome(&outcome)
        .map_err(|e| PipelineError::AggregationFailed {
            collection,
            source: anyhow::Error::new(e)
                .context("no records to score; pass --allow-empty to report anyway"),
        })?;

    Ok(ScoredCollection { outcome, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AggregationConfig, BehaviorConfig, OutputConfig, ScoringConfig};
    use crate::quality::{PredicateSpec, RuleDefinition};
    use std::path::PathBuf;

    fn run_config(allow_empty: bool) -> ScoreRunConfig {
        ScoreRunConfig {
            records: PathBuf::from("maps.jsonl"),
            rubric: PathBuf::from("rubric.yaml"),
            collection: None,
            scoring: ScoringConfig::default(),
            aggregation: AggregationConfig {
                allow_empty,
                ..AggregationConfig::default()
            },
            output: OutputConfig::default(),
            behavior: BehaviorConfig {
                quiet: true,
                ..BehaviorConfig::default()
            },
        }
    }

    fn rubric() -> Rubric {
        Rubric::load(vec![RuleDefinition::new("title", PredicateSpec::NonEmpty)]).unwrap()
    }

    #[test]
    fn test_scores_and_aggregates() {
        let records = vec![
            Record::new("a").with_field("title", "Moon"),
            Record::new("b"),
        ];
        let scored = score_collection(&records, &rubric(), &run_config(false), None).unwrap();
        assert_eq!(scored.report.collection_id, "maps");
        assert_eq!(scored.report.record_count, 2);
        assert_eq!(scored.report.failure_rate("title"), Some(0.5));
    }

    #[test]
    fn test_all_unscoreable_collection_still_reports() {
        let rubric = Rubric::load(vec![RuleDefinition::new(
            "date",
            PredicateSpec::MatchesPattern {
                pattern: r"^\d{4}$".to_string(),
            },
        )])
        .unwrap();
        let records = vec![Record::new("a").with_field(
            "date",
            crate::model::FieldValue::List(vec!["1680".to_string(), "1681".to_string()]),
        )];
        let scored = score_collection(&records, &rubric, &run_config(false), None).unwrap();
        assert_eq!(scored.report.record_count, 0);
        assert_eq!(scored.report.unscoreable.len(), 1);
        assert_eq!(scored.report.unscoreable[0].record_id, "a");
    }

    #[test]
    fn test_empty_collection() {
        let err = score_collection(&[], &rubric(), &run_config(false), None).unwrap_err();
        assert_eq!(err.to_string(), "Aggregation failed for collection 'maps'");
        let chain = format!("{err:#}");
        assert_eq!(chain.matches("empty set of score results").count(), 1, "{chain}");

        let scored = score_collection(&[], &rubric(), &run_config(true), None).unwrap();
        assert_eq!(scored.report.record_count, 0);
    }
}

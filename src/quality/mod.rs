//! Rubric-driven metadata quality scoring.
//!
//! # Features
//!
//! - **Rubrics**: declarative mandatory-field rules loaded from YAML or JSON
//! - **Predicates**: a closed set of field checks (presence, patterns,
//!   vocabularies, cardinality, consistency)
//! - **Scoring**: weighted per-record scores with failed-rule lists, group
//!   sub-scores and A-F grades
//! - **Aggregation**: order-independent collection statistics built with a
//!   parallel fold/reduce
//!
//! # Usage
//!
//! ```
//! use metaqual::model::Record;
//! use metaqual::quality::{aggregate, score, PredicateSpec, Rubric, RuleDefinition};
//!
//! let rubric = Rubric::load(vec![
//!     RuleDefinition::new("title", PredicateSpec::NonEmpty),
//!     RuleDefinition::new("date", PredicateSpec::NonEmpty).with_weight(2.0),
//! ])
//! .unwrap();
//!
//! let record = Record::new("A").with_field("title", "Moon").with_field("date", "");
//! let result = score(&record, &rubric).unwrap();
//! assert_eq!(result.score, 1.0);
//! assert_eq!(result.failed, vec!["date".to_string()]);
//!
//! let report = aggregate("demo", &[result]).unwrap();
//! assert_eq!(report.failure_rate("date"), Some(1.0));
//! ```

mod aggregate;
mod predicate;
mod rubric;
mod scorer;

pub use aggregate::{
    aggregate, AggregateReport, Aggregator, GradeCount, GroupStat, HistogramBucket,
    RuleFailureStat, ScoreAccumulator, ScoreDistribution, DEFAULT_HISTOGRAM_BUCKETS,
};
pub use predicate::{Predicate, PredicateSpec, ShapeMismatch};
pub use rubric::{
    Exclusion, ExclusionDefinition, Rubric, RubricDefinition, Rule, RuleDefinition,
};
pub use scorer::{
    score, score_batch, score_batch_cancellable, score_batch_with, BatchOptions, BatchOutcome,
    ExcludedRecord, QualityGrade, ScoreResult, UnscoreableRecord,
};

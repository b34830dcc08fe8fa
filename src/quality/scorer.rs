//! Record scorer.
//!
//! Applies a [`Rubric`] to records. Scoring a record is a pure function of
//! the record and the rubric, so batches are scored in parallel with rayon
//! and no synchronization beyond an optional cancellation flag.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use super::rubric::Rubric;
use crate::error::EvaluationError;
use crate::model::Record;

/// Quality grade based on the normalized score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum QualityGrade {
    /// Excellent: 90-100
    A,
    /// Good: 80-89
    B,
    /// Fair: 70-79
    C,
    /// Poor: 60-69
    D,
    /// Failing: <60
    F,
}

impl QualityGrade {
    /// Create grade from a 0-100 score
    #[must_use]
    pub const fn from_score(score: f64) -> Self {
        match score as u32 {
            90..=100 => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }

    /// Get grade letter
    #[must_use]
    pub const fn letter(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    /// Get grade description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::A => "Excellent",
            Self::B => "Good",
            Self::C => "Fair",
            Self::D => "Poor",
            Self::F => "Failing",
        }
    }

    /// All grades, best first
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [Self::A, Self::B, Self::C, Self::D, Self::F]
    }
}

/// Outcome of scoring one record against a rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct ScoreResult {
    /// Identifier of the scored record
    pub record_id: String,
    /// Sum of the weights of passed rules
    pub score: f64,
    /// Sum of all rule weights in the rubric
    pub max_score: f64,
    /// Ids of failed rules, in rubric order
    pub failed: Vec<String>,
    /// Whether the record met the rubric's pass threshold
    pub passed: bool,
    /// Fraction of each group's weight the record earned
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub group_scores: IndexMap<String, f64>,
}

impl ScoreResult {
    /// Build a result directly. The record passes when it reaches the
    /// maximum score.
    pub fn new(
        record_id: impl Into<String>,
        score: f64,
        max_score: f64,
        failed: Vec<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            score,
            max_score,
            passed: normalize(score, max_score) >= 1.0,
            failed,
            group_scores: IndexMap::new(),
        }
    }

    /// Score as a fraction of the maximum, in `[0, 1]`.
    ///
    /// A rubric with no weight is vacuously satisfied.
    #[must_use]
    pub fn normalized(&self) -> f64 {
        normalize(self.score, self.max_score)
    }

    /// Score as a 0-100 percentage.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.normalized() * 100.0
    }

    #[must_use]
    pub fn grade(&self) -> QualityGrade {
        QualityGrade::from_score(self.percentage())
    }

    /// Whether the given rule failed for this record.
    #[must_use]
    pub fn failed_rule(&self, rule_id: &str) -> bool {
        self.failed.iter().any(|id| id == rule_id)
    }
}

fn normalize(score: f64, max_score: f64) -> f64 {
    if max_score > 0.0 {
        (score / max_score).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Score a single record.
///
/// Rules run in rubric order. A rule whose prerequisite failed is counted as
/// failed without evaluating its predicate. Fails only when a predicate
/// cannot be applied to the shape of the record's field.
pub fn score(record: &Record, rubric: &Rubric) -> Result<ScoreResult, EvaluationError> {
    let mut earned = 0.0_f64;
    let mut failed = Vec::new();
    let mut outcomes: Vec<bool> = Vec::with_capacity(rubric.len());
    let mut groups: IndexMap<String, (f64, f64)> = IndexMap::new();

    for rule in rubric.rules() {
        let prerequisites_met = rule.prerequisites().iter().all(|&i| outcomes[i]);
        let passed = if prerequisites_met {
            let value = record.field(rule.field());
            rule.predicate()
                .evaluate(value)
                .map_err(|mismatch| EvaluationError {
                    rule_id: rule.id().to_string(),
                    field: rule.field().to_string(),
                    predicate: rule.spec().type_name().to_string(),
                    expected: mismatch.expected.to_string(),
                    found: mismatch.found.to_string(),
                })?
        } else {
            tracing::trace!(
                record = record.id(),
                rule = rule.id(),
                "prerequisite failed, rule not evaluated"
            );
            false
        };

        outcomes.push(passed);
        if passed {
            earned += rule.weight();
        } else {
            failed.push(rule.id().to_string());
        }

        if let Some(group) = rule.group() {
            let entry = groups.entry(group.to_string()).or_insert((0.0, 0.0));
            if passed {
                entry.0 += rule.weight();
            }
            entry.1 += rule.weight();
        }
    }

    let max_score = rubric.total_weight();
    let passed = normalize(earned, max_score) >= rubric.pass_threshold();
    let group_scores = groups
        .into_iter()
        .map(|(group, (got, total))| (group, normalize(got, total)))
        .collect();

    Ok(ScoreResult {
        record_id: record.id().to_string(),
        score: earned,
        max_score,
        failed,
        passed,
        group_scores,
    })
}

// ============================================================================
// Batch scoring
// ============================================================================

/// A record that could not be scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscoreableRecord {
    pub record_id: String,
    pub error: EvaluationError,
}

/// A record skipped by one of the rubric's exclusion filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRecord {
    pub record_id: String,
    pub reason: String,
}

/// Options for batch scoring.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Score records on the rayon thread pool
    pub parallel: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Everything produced by scoring a batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub results: Vec<ScoreResult>,
    pub unscoreable: Vec<UnscoreableRecord>,
    pub excluded: Vec<ExcludedRecord>,
    /// Records not scored because the batch was cancelled
    pub skipped: usize,
}

impl BatchOutcome {
    /// Total number of records the batch was given.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len() + self.unscoreable.len() + self.excluded.len() + self.skipped
    }

    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.skipped > 0
    }
}

enum Disposition {
    Scored(ScoreResult),
    Unscoreable(UnscoreableRecord),
    Excluded(ExcludedRecord),
    Skipped,
}

fn dispose(record: &Record, rubric: &Rubric, cancel: Option<&AtomicBool>) -> Disposition {
    if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
        return Disposition::Skipped;
    }

    if let Some(exclusion) = rubric.exclusion_for(record) {
        tracing::debug!(record = record.id(), field = exclusion.field(), "record excluded");
        return Disposition::Excluded(ExcludedRecord {
            record_id: record.id().to_string(),
            reason: exclusion.describe(),
        });
    }

    match score(record, rubric) {
        Ok(result) => Disposition::Scored(result),
        Err(error) => {
            tracing::warn!("Record '{}' is unscoreable: {}", record.id(), error);
            Disposition::Unscoreable(UnscoreableRecord {
                record_id: record.id().to_string(),
                error,
            })
        }
    }
}

/// Score a batch of records in parallel.
pub fn score_batch(records: &[Record], rubric: &Rubric) -> BatchOutcome {
    score_batch_with(records, rubric, BatchOptions::default(), None)
}

/// Score a batch, stopping work on new records once `cancel` is set.
///
/// Records already in flight finish normally; the rest are counted as
/// skipped. Nothing needs rolling back because scoring has no side effects.
pub fn score_batch_cancellable(
    records: &[Record],
    rubric: &Rubric,
    cancel: &AtomicBool,
) -> BatchOutcome {
    score_batch_with(records, rubric, BatchOptions::default(), Some(cancel))
}

/// Score a batch with explicit options.
pub fn score_batch_with(
    records: &[Record],
    rubric: &Rubric,
    options: BatchOptions,
    cancel: Option<&AtomicBool>,
) -> BatchOutcome {
    let dispositions: Vec<Disposition> = if options.parallel {
        records
            .par_iter()
            .map(|record| dispose(record, rubric, cancel))
            .collect()
    } else {
        records
            .iter()
            .map(|record| dispose(record, rubric, cancel))
            .collect()
    };

    let mut outcome = BatchOutcome::default();
    for disposition in dispositions {
        match disposition {
            Disposition::Scored(result) => outcome.results.push(result),
            Disposition::Unscoreable(record) => outcome.unscoreable.push(record),
            Disposition::Excluded(record) => outcome.excluded.push(record),
            Disposition::Skipped => outcome.skipped += 1,
        }
    }

    tracing::info!(
        "Scored {} record(s): {} unscoreable, {} excluded, {} skipped",
        outcome.results.len(),
        outcome.unscoreable.len(),
        outcome.excluded.len(),
        outcome.skipped
    );

    outcome
}

//! Collection-level aggregation of score results.
//!
//! Partial [`ScoreAccumulator`]s are built per rayon task and merged in a
//! tree reduction. Accumulators only collect counts and raw values; every
//! floating-point statistic is computed from the sorted values when the
//! report is finished, so the result does not depend on reduction order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::rubric::Rubric;
use super::scorer::{BatchOutcome, QualityGrade, ScoreResult, UnscoreableRecord};
use crate::error::EmptyInputError;

/// Default number of histogram buckets over the normalized score.
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 10;

/// Count of records in one slice of the normalized score range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade: QualityGrade,
    pub count: usize,
}

/// Summary statistics of the raw scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Mean of the normalized scores; `None` for an empty collection
    pub normalized_mean: Option<f64>,
    /// Normalized score histogram; the last bucket is closed at 1.0
    pub histogram: Vec<HistogramBucket>,
    pub grades: Vec<GradeCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFailureStat {
    pub rule_id: String,
    pub failures: usize,
    /// Failures divided by the number of scored records
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub group: String,
    /// Mean of the per-record group sub-scores
    pub mean: f64,
}

/// Aggregate view of one scored collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct AggregateReport {
    pub collection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric_fingerprint: Option<String>,
    pub record_count: usize,
    /// Highest score a record could reach
    pub max_score: f64,
    pub passed_count: usize,
    pub failed_count: usize,
    pub distribution: ScoreDistribution,
    pub rule_failures: Vec<RuleFailureStat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_means: Vec<GroupStat>,
    /// Records whose fields could not be evaluated, sorted by id
    #[serde(default)]
    pub unscoreable: Vec<UnscoreableRecord>,
    #[serde(default)]
    pub excluded_count: usize,
    #[serde(default)]
    pub skipped_count: usize,
}

impl AggregateReport {
    /// Failure rate of a rule, if the report knows the rule.
    #[must_use]
    pub fn failure_rate(&self, rule_id: &str) -> Option<f64> {
        self.rule_failures
            .iter()
            .find(|stat| stat.rule_id == rule_id)
            .map(|stat| stat.rate)
    }

    /// Fraction of scored records that passed.
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.record_count == 0 {
            0.0
        } else {
            self.passed_count as f64 / self.record_count as f64
        }
    }

    /// Mean normalized score as a 0-100 percentage.
    #[must_use]
    pub fn mean_percentage(&self) -> f64 {
        self.distribution.normalized_mean.unwrap_or(0.0) * 100.0
    }

    #[must_use]
    pub fn has_unscoreable(&self) -> bool {
        !self.unscoreable.is_empty()
    }
}

// ============================================================================
// Accumulator
// ============================================================================

/// Mergeable partial aggregate.
///
/// `merge` is associative and commutative: the values it holds are
/// multisets and counters.
#[derive(Debug, Clone, Default)]
pub struct ScoreAccumulator {
    scores: Vec<f64>,
    normalized: Vec<f64>,
    max_score: f64,
    passed: usize,
    rule_failures: BTreeMap<String, usize>,
    group_scores: BTreeMap<String, Vec<f64>>,
}

impl ScoreAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one result into the accumulator.
    pub fn push(&mut self, result: &ScoreResult) {
        self.scores.push(result.score);
        self.normalized.push(result.normalized());
        self.max_score = self.max_score.max(result.max_score);
        if result.passed {
            self.passed += 1;
        }
        for rule_id in &result.failed {
            *self.rule_failures.entry(rule_id.clone()).or_insert(0) += 1;
        }
        for (group, value) in &result.group_scores {
            self.group_scores
                .entry(group.clone())
                .or_default()
                .push(*value);
        }
    }

    /// Combine two partial aggregates.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.scores.extend(other.scores);
        self.normalized.extend(other.normalized);
        self.max_score = self.max_score.max(other.max_score);
        self.passed += other.passed;
        for (rule_id, count) in other.rule_failures {
            *self.rule_failures.entry(rule_id).or_insert(0) += count;
        }
        for (group, values) in other.group_scores {
            self.group_scores.entry(group).or_default().extend(values);
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Builds [`AggregateReport`]s.
#[derive(Debug, Clone)]
pub struct Aggregator {
    collection_id: String,
    rubric_fingerprint: Option<String>,
    rubric_max_score: Option<f64>,
    known_rules: Vec<String>,
    known_groups: Vec<String>,
    allow_empty: bool,
    histogram_buckets: usize,
}

impl Aggregator {
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            rubric_fingerprint: None,
            rubric_max_score: None,
            known_rules: Vec::new(),
            known_groups: Vec::new(),
            allow_empty: false,
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
        }
    }

    /// Aggregator that reports every rule of the rubric, in rubric order,
    /// including rules no record failed.
    pub fn for_rubric(collection_id: impl Into<String>, rubric: &Rubric) -> Self {
        let mut aggregator = Self::new(collection_id);
        aggregator.known_rules = rubric.rule_ids().map(str::to_string).collect();
        aggregator.known_groups = rubric.groups().map(|(g, _)| g.to_string()).collect();
        aggregator.rubric_fingerprint = Some(rubric.fingerprint().to_string());
        aggregator.rubric_max_score = Some(rubric.total_weight());
        aggregator
    }

    /// Return a zero-record report instead of failing on empty input.
    #[must_use]
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    #[must_use]
    pub fn histogram_buckets(mut self, buckets: usize) -> Self {
        self.histogram_buckets = buckets.max(1);
        self
    }

    /// Aggregate a set of results.
    pub fn aggregate(&self, results: &[ScoreResult]) -> Result<AggregateReport, EmptyInputError> {
        self.finish(accumulate(results))
    }

    /// Aggregate a batch, carrying its unscoreable and excluded records.
    ///
    /// Only a batch that was given no records at all counts as empty input.
    /// A batch whose records were all unscoreable or excluded still yields a
    /// zero-record report listing them.
    pub fn aggregate_outcome(
        &self,
        outcome: &BatchOutcome,
    ) -> Result<AggregateReport, EmptyInputError> {
        let allow_empty = self.allow_empty || outcome.total() > 0;
        let mut report = self.build(accumulate(&outcome.results), allow_empty)?;
        let mut unscoreable = outcome.unscoreable.clone();
        unscoreable.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        report.unscoreable = unscoreable;
        report.excluded_count = outcome.excluded.len();
        report.skipped_count = outcome.skipped;
        Ok(report)
    }

    /// Turn a merged accumulator into a report.
    pub fn finish(&self, acc: ScoreAccumulator) -> Result<AggregateReport, EmptyInputError> {
        self.build(acc, self.allow_empty)
    }

    fn build(
        &self,
        acc: ScoreAccumulator,
        allow_empty: bool,
    ) -> Result<AggregateReport, EmptyInputError> {
        if acc.is_empty() && !allow_empty {
            return Err(EmptyInputError);
        }

        let count = acc.len();
        let mut scores = acc.scores;
        let mut normalized = acc.normalized;
        scores.sort_by(f64::total_cmp);
        normalized.sort_by(f64::total_cmp);

        let distribution = ScoreDistribution {
            mean: mean(&scores).unwrap_or(0.0),
            median: median(&scores).unwrap_or(0.0),
            min: scores.first().copied().unwrap_or(0.0),
            max: scores.last().copied().unwrap_or(0.0),
            normalized_mean: mean(&normalized),
            histogram: histogram(&normalized, self.histogram_buckets),
            grades: grade_counts(&normalized),
        };

        let rate = |failures: usize| {
            if count == 0 {
                0.0
            } else {
                failures as f64 / count as f64
            }
        };

        let mut failures = acc.rule_failures;
        let mut rule_failures: Vec<RuleFailureStat> = self
            .known_rules
            .iter()
            .map(|id| {
                let n = failures.remove(id).unwrap_or(0);
                RuleFailureStat {
                    rule_id: id.clone(),
                    failures: n,
                    rate: rate(n),
                }
            })
            .collect();
        // Remaining ids come out of the BTreeMap already sorted.
        rule_failures.extend(failures.into_iter().map(|(id, n)| RuleFailureStat {
            rule_id: id,
            failures: n,
            rate: rate(n),
        }));

        let mut groups = acc.group_scores;
        let mut group_means: Vec<GroupStat> = Vec::new();
        for group in &self.known_groups {
            if let Some(values) = groups.remove(group) {
                group_means.push(group_stat(group.clone(), values));
            }
        }
        group_means.extend(
            groups
                .into_iter()
                .map(|(group, values)| group_stat(group, values)),
        );

        tracing::debug!(
            collection = %self.collection_id,
            records = count,
            passed = acc.passed,
            "aggregate finished"
        );

        Ok(AggregateReport {
            collection_id: self.collection_id.clone(),
            rubric_fingerprint: self.rubric_fingerprint.clone(),
            record_count: count,
            max_score: self.rubric_max_score.unwrap_or(acc.max_score),
            passed_count: acc.passed,
            failed_count: count - acc.passed,
            distribution,
            rule_failures,
            group_means,
            unscoreable: Vec::new(),
            excluded_count: 0,
            skipped_count: 0,
        })
    }
}

/// Aggregate results with default settings.
pub fn aggregate(
    collection_id: impl Into<String>,
    results: &[ScoreResult],
) -> Result<AggregateReport, EmptyInputError> {
    Aggregator::new(collection_id).aggregate(results)
}

fn accumulate(results: &[ScoreResult]) -> ScoreAccumulator {
    results
        .par_iter()
        .fold(ScoreAccumulator::new, |mut acc, result| {
            acc.push(result);
            acc
        })
        .reduce(ScoreAccumulator::new, ScoreAccumulator::merge)
}

fn group_stat(group: String, mut values: Vec<f64>) -> GroupStat {
    values.sort_by(f64::total_cmp);
    GroupStat {
        group,
        mean: mean(&values).unwrap_or(0.0),
    }
}

/// Mean of values that are already sorted.
fn mean(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

fn histogram(normalized: &[f64], buckets: usize) -> Vec<HistogramBucket> {
    let buckets = buckets.max(1);
    let mut counts = vec![0usize; buckets];
    for value in normalized {
        let index = ((value * buckets as f64).floor() as usize).min(buckets - 1);
        counts[index] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBucket {
            lower: i as f64 / buckets as f64,
            upper: (i + 1) as f64 / buckets as f64,
            count,
        })
        .collect()
}

fn grade_counts(normalized: &[f64]) -> Vec<GradeCount> {
    let mut counts: BTreeMap<QualityGrade, usize> = BTreeMap::new();
    for value in normalized {
        *counts
            .entry(QualityGrade::from_score(value * 100.0))
            .or_insert(0) += 1;
    }
    QualityGrade::all()
        .into_iter()
        .map(|grade| GradeCount {
            grade,
            count: counts.get(&grade).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use crate::quality::ExcludedRecord;

    fn result(id: &str, score: f64, max: f64, failed: &[&str]) -> ScoreResult {
        ScoreResult::new(
            id,
            score,
            max,
            failed.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    #[test]
    fn test_two_record_collection() {
        let results = vec![
            result("A", 1.0, 3.0, &["date"]),
            result("B", 0.0, 3.0, &["title", "date"]),
        ];
        let report = aggregate("demo", &results).expect("non-empty");
        assert_eq!(report.record_count, 2);
        assert_eq!(report.failure_rate("title"), Some(0.5));
        assert_eq!(report.failure_rate("date"), Some(1.0));
        assert_eq!(report.distribution.mean, 0.5);
        assert_eq!(report.distribution.median, 0.5);
        assert_eq!(report.distribution.min, 0.0);
        assert_eq!(report.distribution.max, 1.0);
        assert_eq!(report.passed_count, 0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(aggregate("demo", &[]).unwrap_err(), EmptyInputError);

        let report = Aggregator::new("demo")
            .allow_empty(true)
            .aggregate(&[])
            .expect("allowed");
        assert_eq!(report.record_count, 0);
        assert_eq!(report.distribution.normalized_mean, None);
        assert_eq!(report.pass_rate(), 0.0);
    }

    #[test]
    fn test_order_independent() {
        let results: Vec<ScoreResult> = (0..50)
            .map(|i| result(&format!("r{i}"), f64::from(i % 7) * 0.1, 0.6, &["x"]))
            .collect();
        let mut reversed = results.clone();
        reversed.reverse();
        assert_eq!(
            aggregate("c", &results).expect("ok"),
            aggregate("c", &reversed).expect("ok")
        );
    }

    fn accumulator_of(results: &[ScoreResult]) -> ScoreAccumulator {
        let mut acc = ScoreAccumulator::new();
        for result in results {
            acc.push(result);
        }
        acc
    }

    #[test]
    fn test_accumulator_merge_commutes() {
        let a = accumulator_of(&[result("a", 1.0, 2.0, &["x"])]);
        let b = accumulator_of(&[result("b", 2.0, 2.0, &[])]);

        let agg = Aggregator::new("c");
        let ab = agg.finish(a.clone().merge(b.clone())).expect("ok");
        let ba = agg.finish(b.merge(a)).expect("ok");
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_accumulator_merge_associates() {
        let mut grouped = result("b", 0.5, 2.0, &["x", "y"]);
        grouped.group_scores.insert("core".to_string(), 0.25);
        let a = accumulator_of(&[result("a", 1.0, 2.0, &["x"]), result("a2", 0.1, 2.0, &["y"])]);
        let b = accumulator_of(&[grouped]);
        let c = accumulator_of(&[result("c", 2.0, 2.0, &[]), result("c2", 0.7, 2.0, &["x"])]);

        let agg = Aggregator::new("c");
        let left = agg
            .finish(a.clone().merge(b.clone()).merge(c.clone()))
            .expect("ok");
        let right = agg.finish(a.merge(b.merge(c))).expect("ok");
        assert_eq!(left, right);
        assert_eq!(left.record_count, 5);
        assert_eq!(left.failure_rate("x"), Some(0.6));
    }

    #[test]
    fn test_rubric_seeded_rules_keep_order() {
        use crate::quality::{PredicateSpec, RuleDefinition};
        let rubric = Rubric::load(vec![
            RuleDefinition::new("title", PredicateSpec::NonEmpty),
            RuleDefinition::new("date", PredicateSpec::NonEmpty),
        ])
        .expect("valid");
        let report = Aggregator::for_rubric("c", &rubric)
            .aggregate(&[result("a", 1.0, 2.0, &["date"])])
            .expect("ok");
        let ids: Vec<&str> = report
            .rule_failures
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();
        assert_eq!(ids, vec!["title", "date"]);
        assert_eq!(report.failure_rate("title"), Some(0.0));
        assert_eq!(
            report.rubric_fingerprint.as_deref(),
            Some(rubric.fingerprint())
        );
    }

    #[test]
    fn test_histogram_and_grades() {
        let results = vec![
            result("a", 0.0, 4.0, &["w", "x", "y", "z"]),
            result("b", 2.0, 4.0, &["y", "z"]),
            result("c", 4.0, 4.0, &[]),
        ];
        let report = Aggregator::new("c")
            .histogram_buckets(4)
            .aggregate(&results)
            .expect("ok");
        let counts: Vec<usize> = report
            .distribution
            .histogram
            .iter()
            .map(|b| b.count)
            .collect();
        assert_eq!(counts, vec![1, 0, 1, 1]);
        assert_eq!(report.distribution.histogram[3].upper, 1.0);

        let a_count = report
            .distribution
            .grades
            .iter()
            .find(|g| g.grade == QualityGrade::A)
            .map(|g| g.count);
        assert_eq!(a_count, Some(1));
        assert_eq!(report.passed_count, 1);
    }

    #[test]
    fn test_group_means() {
        let mut a = result("a", 1.0, 2.0, &["title_2"]);
        a.group_scores.insert("title".to_string(), 0.5);
        let mut b = result("b", 2.0, 2.0, &[]);
        b.group_scores.insert("title".to_string(), 1.0);
        let report = aggregate("c", &[a, b]).expect("ok");
        assert_eq!(report.group_means.len(), 1);
        assert_eq!(report.group_means[0].mean, 0.75);
    }

    #[test]
    fn test_outcome_carries_buckets() {
        let outcome = BatchOutcome {
            results: vec![result("a", 1.0, 1.0, &[])],
            unscoreable: vec![
                UnscoreableRecord {
                    record_id: "z".to_string(),
                    error: EvaluationError {
                        rule_id: "date".to_string(),
                        field: "date".to_string(),
                        predicate: "matches-pattern".to_string(),
                        expected: "text".to_string(),
                        found: "list".to_string(),
                    },
                },
                UnscoreableRecord {
                    record_id: "m".to_string(),
                    error: EvaluationError {
                        rule_id: "date".to_string(),
                        field: "date".to_string(),
                        predicate: "matches-pattern".to_string(),
                        expected: "text".to_string(),
                        found: "list".to_string(),
                    },
                },
            ],
            excluded: Vec::new(),
            skipped: 0,
        };
        let report = Aggregator::new("c").aggregate_outcome(&outcome).expect("ok");
        assert_eq!(report.record_count, 1);
        assert!(report.has_unscoreable());
        assert_eq!(report.unscoreable[0].record_id, "m");
    }

    fn unscoreable(id: &str) -> UnscoreableRecord {
        UnscoreableRecord {
            record_id: id.to_string(),
            error: EvaluationError {
                rule_id: "date_2".to_string(),
                field: "date".to_string(),
                predicate: "matches-pattern".to_string(),
                expected: "text".to_string(),
                found: "list".to_string(),
            },
        }
    }

    #[test]
    fn test_outcome_with_no_scored_records_still_reports() {
        let outcome = BatchOutcome {
            results: Vec::new(),
            unscoreable: vec![unscoreable("r2"), unscoreable("r1")],
            excluded: vec![ExcludedRecord {
                record_id: "r3".to_string(),
                reason: "collection = 25778".to_string(),
            }],
            skipped: 0,
        };
        let report = Aggregator::new("maps").aggregate_outcome(&outcome).expect("ok");
        assert_eq!(report.record_count, 0);
        assert_eq!(report.excluded_count, 1);
        let ids: Vec<&str> = report
            .unscoreable
            .iter()
            .map(|u| u.record_id.as_str())
            .collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        assert_eq!(report.distribution.normalized_mean, None);
    }

    #[test]
    fn test_outcome_of_empty_batch_is_empty_input() {
        let outcome = BatchOutcome {
            results: Vec::new(),
            unscoreable: Vec::new(),
            excluded: Vec::new(),
            skipped: 0,
        };
        assert_eq!(
            Aggregator::new("maps").aggregate_outcome(&outcome).unwrap_err(),
            EmptyInputError
        );
        assert!(Aggregator::new("maps")
            .allow_empty(true)
            .aggregate_outcome(&outcome)
            .is_ok());
    }
}

//! Benchmarks for batch scoring and aggregation.
//!
//! Run with: cargo bench --bench scoring_benchmark

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use metaqual::model::{FieldValue, Record};
use metaqual::quality::{
    score_batch_with, Aggregator, BatchOptions, PredicateSpec, Rubric, RuleDefinition,
};
use std::hint::black_box;

fn rubric() -> Rubric {
    Rubric::load(vec![
        RuleDefinition::new("title", PredicateSpec::NonEmpty)
            .with_id("title_1")
            .in_group("title"),
        RuleDefinition::new("title", PredicateSpec::ExactlyOne)
            .with_id("title_2")
            .in_group("title"),
        RuleDefinition::new("date", PredicateSpec::NonEmpty).with_id("date_1"),
        RuleDefinition::new(
            "date",
            PredicateSpec::MatchesPattern {
                pattern: r"^\d{4}$".to_string(),
            },
        )
        .with_id("date_2")
        .requires("date_1"),
        RuleDefinition::new(
            "genre",
            PredicateSpec::InVocabulary {
                values: vec!["maps".to_string(), "atlases".to_string(), "prints".to_string()],
                case_sensitive: false,
            },
        )
        .with_weight(2.0),
    ])
    .expect("valid rubric")
}

/// Generate a collection where roughly a third of records miss each field.
fn generate_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let mut record = Record::new(format!("rec-{i}"));
            if i % 3 != 0 {
                record = record.with_field("title", format!("Map sheet {i}"));
            }
            if i % 4 != 0 {
                record = record.with_field("date", format!("{}", 1600 + i % 400));
            }
            if i % 5 != 0 {
                record = record.with_field(
                    "genre",
                    FieldValue::List(vec!["Maps".to_string(), "Prints".to_string()]),
                );
            }
            record
        })
        .collect()
}

fn benchmark_score_batch(c: &mut Criterion) {
    let rubric = rubric();
    let mut group = c.benchmark_group("score_batch");

    for size in [1_000, 10_000, 100_000] {
        let records = generate_records(size);
        for parallel in [false, true] {
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, size), &records, |b, records| {
                b.iter(|| {
                    score_batch_with(
                        black_box(records),
                        black_box(&rubric),
                        BatchOptions { parallel },
                        None,
                    )
                });
            });
        }
    }
    group.finish();
}

fn benchmark_aggregate(c: &mut Criterion) {
    let rubric = rubric();
    let mut group = c.benchmark_group("aggregate");

    for size in [1_000, 100_000] {
        let outcome = score_batch_with(
            &generate_records(size),
            &rubric,
            BatchOptions::default(),
            None,
        );
        group.bench_with_input(BenchmarkId::from_parameter(size), &outcome, |b, outcome| {
            b.iter(|| {
                Aggregator::for_rubric("bench", &rubric)
                    .aggregate_outcome(black_box(outcome))
                    .expect("non-empty")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_score_batch, benchmark_aggregate);
criterion_main!(benches);

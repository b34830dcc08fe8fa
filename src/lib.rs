//! **Rubric-based quality scoring for catalog metadata.**
//!
//! `metaqual` checks catalog records (maps, manuscripts, photographs, any
//! flat metadata record) against a declarative rubric of mandatory-field
//! rules, scores every record and summarizes the collection.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: [`Record`], a read-only map from field names to
//!   [`FieldValue`]s. A field that is not declared reads as `Absent`.
//! - **[`quality`]**: the [`Rubric`] (ordered, weighted rules with optional
//!   groups, prerequisites and exclusions), the [`score`] function and the
//!   [`Aggregator`] that turns many [`ScoreResult`]s into an
//!   [`AggregateReport`].
//! - **[`parsers`]**: record ingestion from JSON Lines or JSON arrays.
//! - **[`pipeline`]**: the parse → score → aggregate → report workflow used
//!   by the command-line tool.
//! - **[`reports`]**: summary, table, JSON, CSV and Markdown renderers.
//! - **[`config`]**: configuration types, presets and file discovery.
//!
//! ## Getting Started
//!
//! ```no_run
//! use std::path::Path;
//! use metaqual::quality::{score_batch, Aggregator, Rubric};
//! use metaqual::parsers::parse_records;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rubric = Rubric::from_file(Path::new("rubrics/min-mandatory.yaml"))?;
//!     let parsed = parse_records(Path::new("maps.jsonl"))?;
//!
//!     let outcome = score_batch(&parsed.records, &rubric);
//!     let report = Aggregator::for_rubric("maps", &rubric).aggregate_outcome(&outcome)?;
//!
//!     println!("mean {:.2} over {} records", report.distribution.mean, report.record_count);
//!     for stat in &report.rule_failures {
//!         println!("{}: {:.0}% failing", stat.rule_id, stat.rate * 100.0);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Command-Line Interface (CLI)
//!
//! This documentation is for the `metaqual` library crate. The `metaqual`
//! binary wraps the same pipeline; run `metaqual --help` for usage.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
// Pedantic lints: allow categories that are design choices for this codebase
#![allow(
    // usize to f64 casts in statistics; counts stay far below 2^52
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod quality;
pub mod reports;
pub mod utils;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigPreset, ScoreRunConfig, Validatable};
pub use error::{
    ConfigError, EmptyInputError, ErrorContext, EvaluationError, IngestErrorKind, OptionContext,
    QualityError, Result,
};
pub use model::{FieldValue, Record};
pub use parsers::{parse_records, parse_records_str, ParsedRecords};
pub use quality::{
    aggregate, score, score_batch, AggregateReport, Aggregator, BatchOutcome, PredicateSpec,
    QualityGrade, Rubric, RuleDefinition, ScoreResult,
};
pub use reports::{ReportFormat, ReportGenerator};

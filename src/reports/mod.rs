//! Report generation for scored collections.
//!
//! This module provides multiple output formats for an [`AggregateReport`]
//! and its per-record [`ScoreResult`]s:
//! - Summary: Compact shell-friendly output
//! - Table: Aligned per-record terminal output
//! - JSON: Structured data for programmatic integration
//! - CSV: One row per record with every rule's outcome
//! - Markdown: Human-readable documentation
//!
//! Rendering is a pure function of its inputs; timestamps and file paths
//! arrive through [`ReportConfig`].
//!
//! # Security
//!
//! Record ids and rule ids come from user-supplied files. The `escape`
//! module must be used before embedding them in Markdown or CSV.

mod csv;
pub mod escape;
mod json;
mod markdown;
mod summary;
mod types;

pub use csv::CsvReporter;
pub use json::JsonReporter;
pub use markdown::MarkdownReporter;
pub use summary::{SummaryReporter, TableReporter};
pub use types::{ReportConfig, ReportFormat, ReportMetadata};

use crate::quality::{AggregateReport, ScoreResult};
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Format error: {0}")]
    FormatError(#[from] std::fmt::Error),
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Render a report for an aggregate and the results it was built from
    fn generate(
        &self,
        report: &AggregateReport,
        results: &[ScoreResult],
        config: &ReportConfig,
    ) -> Result<String, ReportError>;

    /// Write report to a writer
    fn write_report(
        &self,
        report: &AggregateReport,
        results: &[ScoreResult],
        config: &ReportConfig,
        writer: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let rendered = self.generate(report, results, config)?;
        writer.write_all(rendered.as_bytes())?;
        Ok(())
    }

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat) -> Box<dyn ReportGenerator> {
    create_reporter_with_options(format, true)
}

/// Create a report generator with color control
#[must_use]
pub fn create_reporter_with_options(
    format: ReportFormat,
    use_color: bool,
) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Summary => {
            if use_color {
                Box::new(SummaryReporter::new())
            } else {
                Box::new(SummaryReporter::new().no_color())
            }
        }
        ReportFormat::Table => {
            if use_color {
                Box::new(TableReporter::new())
            } else {
                Box::new(TableReporter::new().no_color())
            }
        }
        ReportFormat::Json => Box::new(JsonReporter::new()),
        ReportFormat::Csv => Box::new(CsvReporter::new()),
        ReportFormat::Markdown => Box::new(MarkdownReporter::new()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::quality::{AggregateReport, Aggregator, ScoreResult};

    /// Two records scored against `[title (1), date (2)]`, with groups.
    pub fn sample() -> (AggregateReport, Vec<ScoreResult>) {
        let mut a = ScoreResult::new("A", 1.0, 3.0, vec!["date".to_string()]);
        a.group_scores.insert("core".to_string(), 1.0 / 3.0);
        let mut b = ScoreResult::new(
            "B|pipe",
            0.0,
            3.0,
            vec!["title".to_string(), "date".to_string()],
        );
        b.group_scores.insert("core".to_string(), 0.0);
        let results = vec![a, b];
        let report = Aggregator::new("demo").aggregate(&results).expect("non-empty");
        (report, results)
    }
}

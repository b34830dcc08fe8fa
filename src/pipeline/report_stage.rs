//! Report output stage.

use super::{should_use_color, write_output, OutputTarget, PipelineError, ScoredCollection};
use crate::config::ScoreRunConfig;
use crate::error::ErrorContext;
use crate::parsers::IngestFailure;
use crate::quality::Rubric;
use crate::reports::{create_reporter_with_options, ReportConfig, ReportFormat, ReportMetadata};
use anyhow::Result;

/// Build the report configuration for a scoring run.
///
/// Per-record results are only embedded by formats that carry them
/// alongside the aggregate (JSON and Markdown); the table and CSV formats
/// always list records.
#[must_use]
pub fn build_report_config(
    config: &ScoreRunConfig,
    rubric: &Rubric,
    ingest_failures: Vec<IngestFailure>,
) -> ReportConfig {
    let mut metadata = ReportMetadata::new().generated_now();
    metadata.records_path = Some(config.records.to_string_lossy().to_string());
    metadata.rubric_path = Some(config.rubric.to_string_lossy().to_string());
    metadata.rubric_name = Some(rubric.name().map_or_else(
        || {
            config
                .rubric
                .file_stem()
                .map_or_else(|| "rubric".to_string(), |s| s.to_string_lossy().to_string())
        },
        str::to_string,
    ));

    ReportConfig {
        include_records: matches!(
            config.output.format,
            ReportFormat::Json | ReportFormat::Markdown
        ),
        metadata,
        ingest_failures,
        ..ReportConfig::default()
    }
}

/// Render the report and write it to the configured destination.
pub fn output_report(
    config: &ScoreRunConfig,
    scored: &ScoredCollection,
    report_config: &ReportConfig,
) -> Result<()> {
    let target = OutputTarget::from_option(config.output.file.clone());
    let use_color = should_use_color(config.output.no_color, &target);
    let reporter = create_reporter_with_options(config.output.format, use_color);

    let rendered = reporter
        .generate(&scored.report, &scored.outcome.results, report_config)
        .with_context(|| format!("rendering {} report", config.output.format))
        .map_err(|e| PipelineError::ReportFailed { source: e.into() })?;

    write_output(&rendered, &target, config.behavior.quiet)
}

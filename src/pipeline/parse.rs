//! Input loading stage.

use super::PipelineError;
use crate::parsers::{parse_records, ParsedRecords};
use crate::quality::Rubric;
use anyhow::Result;
use std::path::Path;

/// Load a record file with context for error messages.
pub fn load_records_with_context(path: &Path, quiet: bool) -> Result<ParsedRecords> {
    if !quiet {
        tracing::info!("Reading records: {}", path.display());
    }

    let parsed = parse_records(path).map_err(|e| PipelineError::IngestFailed {
        path: path.display().to_string(),
        source: e.into(),
    })?;

    if !quiet {
        tracing::info!(
            "Loaded {} record(s) ({})",
            parsed.records.len(),
            parsed.layout.name()
        );
    }
    if parsed.has_failures() {
        tracing::warn!(
            "{} entr{} in {} could not be ingested",
            parsed.failures.len(),
            if parsed.failures.len() == 1 { "y" } else { "ies" },
            path.display()
        );
    }

    Ok(parsed)
}

/// Load and compile a rubric file with context for error messages.
pub fn load_rubric_with_context(path: &Path, quiet: bool) -> Result<Rubric> {
    let rubric = Rubric::from_file(path).map_err(|e| PipelineError::RubricInvalid {
        path: path.display().to_string(),
        source: e.into(),
    })?;

    if !quiet {
        tracing::info!(
            "Loaded rubric {} ({} rule(s), max score {}, fingerprint {})",
            rubric.name().unwrap_or("<unnamed>"),
            rubric.len(),
            rubric.total_weight(),
            rubric.fingerprint()
        );
    }
    if rubric.is_empty() {
        tracing::warn!("Rubric {} has no rules; every record passes vacuously", path.display());
    }

    Ok(rubric)
}

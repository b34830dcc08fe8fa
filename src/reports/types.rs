//! Report type definitions.

use crate::parsers::IngestFailure;
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output format for reports
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Brief summary output
    #[default]
    Summary,
    /// Per-record table for terminal (colored)
    Table,
    /// Structured JSON output
    Json,
    /// One row per record for spreadsheet import
    Csv,
    /// Human-readable Markdown
    #[value(alias = "md")]
    Markdown,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

/// Configuration for report generation
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportConfig {
    /// Title for the report
    pub title: Option<String>,
    /// Maximum items per list section (rule failures are never truncated)
    pub max_items: Option<usize>,
    /// Include per-record results where the format supports it
    pub include_records: bool,
    /// Additional metadata to include
    pub metadata: ReportMetadata,
    /// Input entries skipped during ingestion
    pub ingest_failures: Vec<IngestFailure>,
}

impl ReportConfig {
    /// Config that includes per-record results.
    #[must_use]
    pub fn with_records() -> Self {
        Self {
            include_records: true,
            ..Self::default()
        }
    }

    /// Apply `max_items` to a list length.
    #[must_use]
    pub fn limit(&self, len: usize) -> usize {
        self.max_items.map_or(len, |max| len.min(max))
    }
}

/// Metadata included in reports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Tool version
    pub tool_version: String,
    /// Generation timestamp (RFC 3339)
    pub generated_at: Option<String>,
    /// Record file path
    pub records_path: Option<String>,
    /// Rubric file path
    pub rubric_path: Option<String>,
    /// Rubric display name
    pub rubric_name: Option<String>,
}

impl ReportMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        }
    }

    /// Stamp the metadata with the current time.
    #[must_use]
    pub fn generated_now(mut self) -> Self {
        self.generated_at = Some(chrono::Utc::now().to_rfc3339());
        self
    }
}

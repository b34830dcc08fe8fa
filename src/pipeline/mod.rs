//! Pipeline orchestration for scoring runs.
//!
//! This module provides the shared parse → score → aggregate → report
//! workflow used by the CLI command handlers.

mod output;
mod parse;
mod report_stage;
mod score_stage;

pub use output::{should_use_color, write_output, OutputTarget};
pub use parse::{load_records_with_context, load_rubric_with_context};
pub use report_stage::{build_report_config, output_report};
pub use score_stage::{score_collection, ScoredCollection};

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to read or parse a record file
    #[error("Ingest failed for {path}")]
    IngestFailed {
        path: String,
        source: anyhow::Error,
    },

    /// The rubric could not be loaded
    #[error("Rubric {path} is invalid")]
    RubricInvalid {
        path: String,
        source: anyhow::Error,
    },

    /// Aggregation failed
    #[error("Aggregation failed for collection '{collection}'")]
    AggregationFailed {
        collection: String,
        #[source]
        source: anyhow::Error,
    },

    /// Report generation or output failed
    #[error("Report failed")]
    ReportFailed {
        #[source]
        source: anyhow::Error,
    },
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// The mean score is below `--min-score`
    pub const THRESHOLD_NOT_MET: i32 = 1;
    /// Records could not be scored (with `--fail-on-unscoreable`)
    pub const UNSCOREABLE_RECORDS: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;
}

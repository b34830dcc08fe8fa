//! Configuration types for metaqual runs.

use crate::quality::DEFAULT_HISTOGRAM_BUCKETS;
use crate::reports::ReportFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or
/// config files, with CLI values overriding file values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Scoring configuration (rubric, parallelism)
    pub scoring: ScoringConfig,
    /// Aggregation configuration
    pub aggregation: AggregationConfig,
    /// Output configuration (format, file, colors)
    pub output: OutputConfig,
    /// Behavior flags and CI thresholds
    pub behavior: BehaviorConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the rubric file.
    pub fn rubric(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.scoring.rubric = Some(path.into());
        self
    }

    /// Score records sequentially instead of on the thread pool.
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.config.scoring.parallel = parallel;
        self
    }

    /// Produce an empty report instead of failing on zero records.
    pub const fn allow_empty(mut self, allow: bool) -> Self {
        self.config.aggregation.allow_empty = allow;
        self
    }

    pub const fn histogram_buckets(mut self, buckets: usize) -> Self {
        self.config.aggregation.histogram_buckets = buckets;
        self
    }

    /// Set the output format.
    pub const fn output_format(mut self, format: ReportFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Disable colored output.
    pub const fn no_color(mut self, no_color: bool) -> Self {
        self.config.output.no_color = no_color;
        self
    }

    /// Minimum mean score (0-100) required for a successful exit.
    pub const fn min_score(mut self, min_score: Option<f32>) -> Self {
        self.config.behavior.min_score = min_score;
        self
    }

    /// Exit non-zero when any record is unscoreable.
    pub const fn fail_on_unscoreable(mut self, fail: bool) -> Self {
        self.config.behavior.fail_on_unscoreable = fail;
        self
    }

    /// Enable quiet mode.
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.behavior.quiet = quiet;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Section Configurations
// ============================================================================

/// Scoring configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScoringConfig {
    /// Rubric definition file (YAML or JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rubric: Option<PathBuf>,
    /// Score records on all available cores
    pub parallel: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rubric: None,
            parallel: true,
        }
    }
}

/// Aggregation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AggregationConfig {
    /// Produce a zero-record report instead of failing on empty input
    pub allow_empty: bool,
    /// Number of buckets in the normalized score histogram
    #[schemars(range(min = 1, max = 100))]
    pub histogram_buckets: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            allow_empty: false,
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: ReportFormat,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Disable colored output
    pub no_color: bool,
}

/// Behavior flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Exit with code 1 if the mean score (0-100) is below this value
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0.0, max = 100.0))]
    pub min_score: Option<f32>,
    /// Exit with code 2 if any record is unscoreable
    pub fail_on_unscoreable: bool,
    /// Suppress non-essential output
    pub quiet: bool,
}

// ============================================================================
// Command Configurations
// ============================================================================

/// Configuration for a single `score` run, resolved from CLI and file.
#[derive(Debug, Clone)]
pub struct ScoreRunConfig {
    /// Record file (JSON Lines or JSON array)
    pub records: PathBuf,
    /// Rubric definition file
    pub rubric: PathBuf,
    /// Collection identifier; defaults to the record file stem
    pub collection: Option<String>,
    pub scoring: ScoringConfig,
    pub aggregation: AggregationConfig,
    pub output: OutputConfig,
    pub behavior: BehaviorConfig,
}

impl ScoreRunConfig {
    /// Resolve the collection id.
    #[must_use]
    pub fn collection_id(&self) -> String {
        self.collection.clone().unwrap_or_else(|| {
            self.records
                .file_stem()
                .map_or_else(|| "collection".to_string(), |s| s.to_string_lossy().into_owned())
        })
    }
}

//! Configuration validation.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{
    AggregationConfig, AppConfig, BehaviorConfig, OutputConfig, ScoreRunConfig, ScoringConfig,
};

// ============================================================================
// Validation Error
// ============================================================================

/// A configuration value that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigValidationError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigValidationError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        errors.extend(self.scoring.validate());
        errors.extend(self.aggregation.validate());
        errors.extend(self.output.validate());
        errors.extend(self.behavior.validate());
        errors
    }
}

impl Validatable for ScoringConfig {
    fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        if let Some(ref rubric) = self.rubric {
            if !rubric.exists() {
                errors.push(ConfigValidationError::new(
                    "scoring.rubric",
                    format!("Rubric file not found: {}", rubric.display()),
                ));
            }
        }
        errors
    }
}

impl Validatable for AggregationConfig {
    fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        if !(1..=100).contains(&self.histogram_buckets) {
            errors.push(ConfigValidationError::new(
                "aggregation.histogram_buckets",
                format!(
                    "Histogram buckets must be between 1 and 100, got {}",
                    self.histogram_buckets
                ),
            ));
        }
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if let Some(ref file_path) = self.file {
            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(ConfigValidationError::new(
                        "output.file",
                        format!("Parent directory does not exist: {}", parent.display()),
                    ));
                }
            }
        }

        errors
    }
}

impl Validatable for BehaviorConfig {
    fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        if let Some(min_score) = self.min_score {
            if !(0.0..=100.0).contains(&min_score) {
                errors.push(ConfigValidationError::new(
                    "behavior.min_score",
                    format!("Minimum score must be between 0 and 100, got {min_score}"),
                ));
            }
        }
        errors
    }
}

impl Validatable for ScoreRunConfig {
    fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if !self.records.exists() {
            errors.push(ConfigValidationError::new(
                "records",
                format!("Record file not found: {}", self.records.display()),
            ));
        }
        if !self.rubric.exists() {
            errors.push(ConfigValidationError::new(
                "rubric",
                format!("Rubric file not found: {}", self.rubric.display()),
            ));
        }
        if let Some(ref collection) = self.collection {
            if collection.trim().is_empty() {
                errors.push(ConfigValidationError::new(
                    "collection",
                    "Collection id must not be blank",
                ));
            }
        }

        errors.extend(self.aggregation.validate());
        errors.extend(self.output.validate());
        errors.extend(self.behavior.validate());
        errors
    }
}

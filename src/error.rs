//! Unified error types for metaqual.
//!
//! The scoring core distinguishes three failure classes:
//!
//! - [`ConfigError`]: the rubric itself is malformed. Fatal, raised before
//!   any record is scored.
//! - [`EvaluationError`]: one record's field has a shape its rule cannot be
//!   applied to. Isolated per record; the record lands in the unscoreable
//!   bucket of the aggregate report.
//! - [`EmptyInputError`]: aggregation was asked to summarize zero results.
//!
//! [`QualityError`] wraps the fatal ones (plus ingestion, report and IO
//! failures) for the library-level API, with a context chain for debugging.
//! Evaluation errors never abort a run, so they travel as data in
//! [`UnscoreableRecord`] instead.
//!
//! [`UnscoreableRecord`]: crate::quality::UnscoreableRecord

use crate::reports::ReportError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for metaqual operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum QualityError {
    /// The rubric definition is invalid
    #[error("Invalid rubric: {context}")]
    Config {
        context: String,
        #[source]
        source: ConfigError,
    },

    /// Aggregation over an empty result set
    #[error("Aggregation failed: {context}")]
    EmptyInput {
        context: String,
        #[source]
        source: EmptyInputError,
    },

    /// Errors while reading records
    #[error("Failed to ingest records: {context}")]
    Ingest {
        context: String,
        #[source]
        source: IngestErrorKind,
    },

    /// Errors during report generation
    #[error("Report generation failed: {0}")]
    Report(String),

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// A rubric definition that cannot be turned into a usable [`Rubric`].
///
/// [`Rubric`]: crate::quality::Rubric
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("duplicate rule id '{0}'")]
    DuplicateRuleId(String),

    #[error("rule #{index} has an empty {what}")]
    EmptyName { index: usize, what: &'static str },

    #[error("rule '{rule}' has invalid weight {weight} (weights must be finite and non-negative)")]
    InvalidWeight { rule: String, weight: f64 },

    #[error("rule '{rule}' has an invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        message: String,
    },

    #[error("rule '{rule}' has an empty vocabulary")]
    EmptyVocabulary { rule: String },

    #[error("rule '{rule}': {message}")]
    InvalidArgument { rule: String, message: String },

    #[error("rule '{rule}' requires '{requires}', which is not defined before it")]
    UnknownPrerequisite { rule: String, requires: String },

    #[error("pass threshold must be between 0.0 and 1.0, got {0}")]
    InvalidThreshold(f64),

    #[error("exclusion #{index} is invalid: {message}")]
    InvalidExclusion { index: usize, message: String },

    #[error("malformed rubric definition: {0}")]
    Syntax(String),
}

/// A rule's predicate could not be applied to the value a record holds.
///
/// This is surfaced rather than treated as a plain failure so that shape
/// problems in the source data are never silently under-counted.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("rule '{rule_id}' cannot apply {predicate} to field '{field}': expected {expected}, found {found}")]
pub struct EvaluationError {
    /// Rule whose predicate failed to apply
    pub rule_id: String,
    /// Field the rule targets
    pub field: String,
    /// Predicate type name
    pub predicate: String,
    /// Value shape the predicate accepts
    pub expected: String,
    /// Value shape the record actually holds
    pub found: String,
}

/// Aggregation was given nothing to aggregate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot aggregate an empty set of score results")]
pub struct EmptyInputError;

/// Specific ingestion error kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestErrorKind {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Record has no usable 'id'")]
    MissingId,

    #[error("Invalid value for field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Duplicate record id '{0}'")]
    DuplicateId(String),

    #[error("Unsupported input layout: {0}")]
    UnsupportedLayout(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for metaqual operations
pub type Result<T> = std::result::Result<T, QualityError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl QualityError {
    /// Create a rubric configuration error with context
    pub fn config(context: impl Into<String>, source: ConfigError) -> Self {
        Self::Config {
            context: context.into(),
            source,
        }
    }

    /// Create an ingestion error with context
    pub fn ingest(context: impl Into<String>, source: IngestErrorKind) -> Self {
        Self::Ingest {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report(message.into())
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for QualityError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for QualityError {
    fn from(err: serde_json::Error) -> Self {
        Self::ingest(
            "JSON deserialization",
            IngestErrorKind::InvalidJson(err.to_string()),
        )
    }
}

impl From<ConfigError> for QualityError {
    fn from(err: ConfigError) -> Self {
        Self::config("", err)
    }
}

impl From<ReportError> for QualityError {
    fn from(err: ReportError) -> Self {
        Self::report(err.to_string())
    }
}

impl From<EmptyInputError> for QualityError {
    fn from(err: EmptyInputError) -> Self {
        Self::EmptyInput {
            context: String::new(),
            source: err,
        }
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings chain outward, so an error raised three layers deep
/// reads `"outer: middle: inner"`.
///
/// # Example
///
/// ```ignore
/// use metaqual::error::ErrorContext;
///
/// let rubric = Rubric::from_file(path)
///     .with_context(|| format!("loading rubric {}", path.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<QualityError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: QualityError, new_ctx: &str) -> QualityError {
    match err {
        QualityError::Config {
            context: existing,
            source,
        } => QualityError::Config {
            context: chain_context(new_ctx, &existing),
            source,
        },
        QualityError::EmptyInput {
            context: existing,
            source,
        } => QualityError::EmptyInput {
            context: chain_context(new_ctx, &existing),
            source,
        },
        QualityError::Ingest {
            context: existing,
            source,
        } => QualityError::Ingest {
            context: chain_context(new_ctx, &existing),
            source,
        },
        QualityError::Io {
            path,
            message,
            source,
        } => QualityError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        QualityError::Report(msg) => QualityError::Report(chain_context(new_ctx, &msg)),
        QualityError::Validation(msg) => QualityError::Validation(chain_context(new_ctx, &msg)),
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to an error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| QualityError::validation(context))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| QualityError::validation(f()))
    }
}

//! Configuration module for metaqual.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - Named presets for common use cases
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use metaqual::config::{AppConfig, ConfigPreset};
//!
//! let config = AppConfig::from_preset(ConfigPreset::Ci);
//!
//! let config = AppConfig::builder()
//!     .rubric("rubrics/min-mandatory.yaml")
//!     .min_score(Some(80.0))
//!     .build();
//!
//! use metaqual::config::file::load_or_default;
//! let (config, loaded_from) = load_or_default(None);
//! ```
//!
//! # Configuration File
//!
//! Place a `.metaqual.yaml` file in your project root or `~/.config/metaqual/`:
//!
//! ```yaml
//! scoring:
//!   rubric: rubrics/min-mandatory.yaml
//! output:
//!   format: markdown
//! behavior:
//!   min_score: 80
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::ConfigPreset;
pub use types::{
    AggregationConfig, AppConfig, AppConfigBuilder, BehaviorConfig, OutputConfig, ScoreRunConfig,
    ScoringConfig,
};
pub use validation::{ConfigValidationError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    user_config_dir, ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// Editors can use it to validate and autocomplete `.metaqual.yaml`.
pub fn generate_json_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema)
}

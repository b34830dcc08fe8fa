//! Named configuration presets.

use super::types::{AppConfig, BehaviorConfig, OutputConfig};
use crate::reports::ReportFormat;

/// Named configuration presets for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Human-readable summary, no failure thresholds
    Default,
    /// CI: JSON output without color, fail on unscoreable records
    Ci,
    /// Audit: per-record CSV for spreadsheet review
    Audit,
}

impl ConfigPreset {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Ci => "ci",
            Self::Audit => "audit",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "ci" | "ci-cd" | "pipeline" => Some(Self::Ci),
            "audit" | "csv" => Some(Self::Audit),
            _ => None,
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "Colored summary on stdout",
            Self::Ci => "Machine-readable JSON, fails when records cannot be scored",
            Self::Audit => "One CSV row per record with every rule's outcome",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::Ci, Self::Audit]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::Ci => Self {
                output: OutputConfig {
                    format: ReportFormat::Json,
                    file: None,
                    no_color: true,
                },
                behavior: BehaviorConfig {
                    fail_on_unscoreable: true,
                    quiet: true,
                    ..BehaviorConfig::default()
                },
                ..Self::default()
            },
            ConfigPreset::Audit => Self {
                output: OutputConfig {
                    format: ReportFormat::Csv,
                    ..OutputConfig::default()
                },
                ..Self::default()
            },
        }
    }
}

//! Rubric command handlers.
//!
//! Implements `rubric validate` and `rubric show`.

use crate::pipeline::{exit_codes, load_rubric_with_context, write_output, OutputTarget};
use crate::quality::Rubric;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;

/// Output format for `rubric show`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RubricShowFormat {
    /// Aligned rule listing
    #[default]
    Text,
    /// Compiled rules as JSON
    Json,
}

#[derive(Serialize)]
struct RubricSummary<'a> {
    name: Option<&'a str>,
    fingerprint: &'a str,
    pass_threshold: f64,
    max_score: f64,
    rules: Vec<RuleSummary<'a>>,
    groups: Vec<GroupSummary<'a>>,
    exclusions: Vec<ExclusionSummary<'a>>,
}

#[derive(Serialize)]
struct RuleSummary<'a> {
    id: &'a str,
    field: &'a str,
    predicate: String,
    weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    requires: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct GroupSummary<'a> {
    group: &'a str,
    weight: f64,
}

#[derive(Serialize)]
struct ExclusionSummary<'a> {
    field: &'a str,
    reason: String,
}

impl<'a> RubricSummary<'a> {
    fn new(rubric: &'a Rubric) -> Self {
        let rules = rubric
            .rules()
            .iter()
            .map(|rule| RuleSummary {
                id: rule.id(),
                field: rule.field(),
                predicate: rule.spec().to_string(),
                weight: rule.weight(),
                group: rule.group(),
                requires: rule
                    .prerequisites()
                    .iter()
                    .filter_map(|&pos| rubric.rules().get(pos).map(|r| r.id()))
                    .collect(),
                description: rule.description(),
            })
            .collect();

        Self {
            name: rubric.name(),
            fingerprint: rubric.fingerprint(),
            pass_threshold: rubric.pass_threshold(),
            max_score: rubric.total_weight(),
            rules,
            groups: rubric
                .groups()
                .map(|(group, weight)| GroupSummary { group, weight })
                .collect(),
            exclusions: rubric
                .exclusions()
                .iter()
                .map(|ex| ExclusionSummary {
                    field: ex.field(),
                    reason: ex.describe(),
                })
                .collect(),
        }
    }

    fn render_text(&self) -> String {
        let mut lines = vec![format!(
            "Rubric: {} ({})",
            self.name.unwrap_or("<unnamed>"),
            self.fingerprint
        )];
        lines.push(format!(
            "Max score: {}  Pass threshold: {:.0}%",
            self.max_score,
            self.pass_threshold * 100.0
        ));
        lines.push(String::new());

        let id_width = self.rules.iter().map(|r| r.id.len()).max().unwrap_or(2).max(2);
        let field_width = self
            .rules
            .iter()
            .map(|r| r.field.len())
            .max()
            .unwrap_or(5)
            .max(5);
        lines.push(format!(
            "{:<id_width$}  {:<field_width$}  {:>6}  PREDICATE",
            "ID", "FIELD", "WEIGHT"
        ));
        for rule in &self.rules {
            let mut line = format!(
                "{:<id_width$}  {:<field_width$}  {:>6}  {}",
                rule.id, rule.field, rule.weight, rule.predicate
            );
            if let Some(group) = rule.group {
                line.push_str(&format!("  [{group}]"));
            }
            if !rule.requires.is_empty() {
                line.push_str(&format!("  requires {}", rule.requires.join(", ")));
            }
            lines.push(line);
        }

        if !self.exclusions.is_empty() {
            lines.push(String::new());
            lines.push("Exclusions:".to_string());
            for ex in &self.exclusions {
                lines.push(format!("  {}: {}", ex.field, ex.reason));
            }
        }
        lines.join("\n")
    }
}

/// Validate a rubric file, printing a one-line summary on success.
pub fn run_rubric_validate(path: &Path, quiet: bool) -> Result<i32> {
    let rubric = load_rubric_with_context(path, true)?;
    if !quiet {
        let groups = rubric.groups().count();
        println!(
            "{}: valid ({} rule(s), {} group(s), {} exclusion(s), max score {}, fingerprint {})",
            path.display(),
            rubric.len(),
            groups,
            rubric.exclusions().len(),
            rubric.total_weight(),
            rubric.fingerprint()
        );
    }
    Ok(exit_codes::SUCCESS)
}

/// Print the compiled rules of a rubric.
pub fn run_rubric_show(path: &Path, format: RubricShowFormat, quiet: bool) -> Result<i32> {
    let rubric = load_rubric_with_context(path, true)?;
    let summary = RubricSummary::new(&rubric);
    let rendered = match format {
        RubricShowFormat::Text => summary.render_text(),
        RubricShowFormat::Json => {
            serde_json::to_string_pretty(&summary).context("failed to serialize rubric")?
        }
    };
    write_output(&rendered, &OutputTarget::Stdout, quiet)?;
    Ok(exit_codes::SUCCESS)
}

//! Markdown report generator.

use super::escape::{escape_markdown_inline, escape_markdown_table};
use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::quality::{AggregateReport, QualityGrade, ScoreResult};
use std::fmt::Write;

/// Markdown report generator
pub struct MarkdownReporter;

impl MarkdownReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for MarkdownReporter {
    fn generate(
        &self,
        report: &AggregateReport,
        results: &[ScoreResult],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut md = String::new();
        let dist = &report.distribution;

        let title = config
            .title
            .as_deref()
            .unwrap_or("Metadata Quality Report");
        writeln!(md, "# {}\n", escape_markdown_inline(title))?;

        writeln!(
            md,
            "**Collection:** {}  ",
            escape_markdown_inline(&report.collection_id)
        )?;
        if let Some(name) = &config.metadata.rubric_name {
            write!(md, "**Rubric:** {}", escape_markdown_inline(name))?;
            if let Some(fingerprint) = &report.rubric_fingerprint {
                write!(md, " (`{fingerprint}`)")?;
            }
            writeln!(md, "  ")?;
        }
        if let Some(generated_at) = &config.metadata.generated_at {
            writeln!(md, "**Generated:** {generated_at}  ")?;
        }
        writeln!(md, "**Tool version:** {}\n", config.metadata.tool_version)?;

        writeln!(md, "## Summary\n")?;
        writeln!(md, "| Metric | Value |")?;
        writeln!(md, "|--------|-------|")?;
        writeln!(md, "| Records scored | {} |", report.record_count)?;
        writeln!(md, "| Unscoreable | {} |", report.unscoreable.len())?;
        writeln!(md, "| Excluded | {} |", report.excluded_count)?;
        if report.skipped_count > 0 {
            writeln!(md, "| Skipped | {} |", report.skipped_count)?;
        }
        if !config.ingest_failures.is_empty() {
            writeln!(md, "| Rejected at ingest | {} |", config.ingest_failures.len())?;
        }
        writeln!(
            md,
            "| Passed | {} ({:.1}%) |",
            report.passed_count,
            report.pass_rate() * 100.0
        )?;
        writeln!(
            md,
            "| Mean score | {:.2} / {:.2} ({:.1}%, grade {}) |",
            dist.mean,
            report.max_score,
            report.mean_percentage(),
            QualityGrade::from_score(report.mean_percentage()).letter()
        )?;
        writeln!(md, "| Median score | {:.2} |", dist.median)?;
        writeln!(md, "| Range | {:.2} - {:.2} |\n", dist.min, dist.max)?;

        writeln!(md, "## Rule Failures\n")?;
        if report.rule_failures.is_empty() {
            writeln!(md, "_No rule failures._\n")?;
        } else {
            writeln!(md, "| Rule | Failures | Rate |")?;
            writeln!(md, "|------|----------|------|")?;
            for stat in &report.rule_failures {
                writeln!(
                    md,
                    "| {} | {} | {:.1}% |",
                    escape_markdown_table(&stat.rule_id),
                    stat.failures,
                    stat.rate * 100.0
                )?;
            }
            writeln!(md)?;
        }

        if !report.group_means.is_empty() {
            writeln!(md, "## Groups\n")?;
            writeln!(md, "| Group | Mean sub-score |")?;
            writeln!(md, "|-------|----------------|")?;
            for group in &report.group_means {
                writeln!(
                    md,
                    "| {} | {:.2} |",
                    escape_markdown_table(&group.group),
                    group.mean
                )?;
            }
            writeln!(md)?;
        }

        writeln!(md, "## Score Distribution\n")?;
        writeln!(md, "| Normalized range | Records |")?;
        writeln!(md, "|------------------|---------|")?;
        for bucket in &dist.histogram {
            writeln!(
                md,
                "| {:.2} - {:.2} | {} |",
                bucket.lower, bucket.upper, bucket.count
            )?;
        }
        writeln!(md)?;

        if report.has_unscoreable() {
            writeln!(md, "## Unscoreable Records\n")?;
            writeln!(md, "| Record | Rule | Problem |")?;
            writeln!(md, "|--------|------|---------|")?;
            let shown = config.limit(report.unscoreable.len());
            for record in report.unscoreable.iter().take(shown) {
                writeln!(
                    md,
                    "| {} | {} | expected {}, found {} |",
                    escape_markdown_table(&record.record_id),
                    escape_markdown_table(&record.error.rule_id),
                    record.error.expected,
                    record.error.found
                )?;
            }
            writeln!(md)?;
        }

        if config.include_records && !results.is_empty() {
            writeln!(md, "## Records\n")?;
            writeln!(md, "| Record | Score | Grade | Passed | Failed rules |")?;
            writeln!(md, "|--------|-------|-------|--------|--------------|")?;
            for result in results.iter().take(config.limit(results.len())) {
                let failed = if result.failed.is_empty() {
                    "-".to_string()
                } else {
                    escape_markdown_table(&result.failed.join(", "))
                };
                writeln!(
                    md,
                    "| {} | {:.2} | {} | {} | {} |",
                    escape_markdown_table(&result.record_id),
                    result.score,
                    result.grade().letter(),
                    if result.passed { "yes" } else { "no" },
                    failed
                )?;
            }
            writeln!(md)?;
        }

        Ok(md)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Markdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::test_support::sample;

    #[test]
    fn test_sections() {
        let (report, results) = sample();
        let output = MarkdownReporter::new()
            .generate(&report, &results, &ReportConfig::default())
            .expect("render");
        assert!(output.starts_with("# Metadata Quality Report"));
        assert!(output.contains("| date | 2 | 100.0% |"));
        assert!(output.contains("| title | 1 | 50.0% |"));
        assert!(output.contains("## Groups"));
        assert!(!output.contains("## Records"));
    }

    #[test]
    fn test_record_ids_escaped() {
        let (report, results) = sample();
        let output = MarkdownReporter::new()
            .generate(&report, &results, &ReportConfig::with_records())
            .expect("render");
        assert!(output.contains("| B\\|pipe |"));
    }
}

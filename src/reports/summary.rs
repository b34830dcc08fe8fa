//! Summary and table report generators for shell output.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::quality::{AggregateReport, QualityGrade, ScoreResult};
use unicode_width::UnicodeWidthChar;

/// Apply ANSI color formatting if colored output is enabled.
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

const fn grade_color(grade: QualityGrade) -> &'static str {
    match grade {
        QualityGrade::A | QualityGrade::B => "green",
        QualityGrade::C | QualityGrade::D => "yellow",
        _ => "red",
    }
}

fn rate_color(rate: f64) -> &'static str {
    if rate == 0.0 {
        "green"
    } else if rate < 0.5 {
        "yellow"
    } else {
        "red"
    }
}

/// Summary reporter for shell output
pub struct SummaryReporter {
    /// Use colored output
    colored: bool,
}

impl SummaryReporter {
    /// Create a new summary reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for SummaryReporter {
    fn generate(
        &self,
        report: &AggregateReport,
        _results: &[ScoreResult],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        let dist = &report.distribution;

        let title = config
            .title
            .as_deref()
            .unwrap_or("Metadata Quality Summary");
        lines.push(self.color(title, "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));

        lines.push(format!(
            "{}  {}",
            self.color("Collection:", "cyan"),
            report.collection_id
        ));
        if let Some(name) = &config.metadata.rubric_name {
            let fingerprint = report
                .rubric_fingerprint
                .as_deref()
                .map(|f| format!(" ({f})"))
                .unwrap_or_default();
            lines.push(format!(
                "{}      {name}{}",
                self.color("Rubric:", "cyan"),
                self.color(&fingerprint, "dim")
            ));
        }

        let mut record_line = format!("{} scored", report.record_count);
        if report.has_unscoreable() {
            record_line.push_str(&format!(", {} unscoreable", report.unscoreable.len()));
        }
        if report.excluded_count > 0 {
            record_line.push_str(&format!(", {} excluded", report.excluded_count));
        }
        if report.skipped_count > 0 {
            record_line.push_str(&format!(", {} skipped", report.skipped_count));
        }
        if !config.ingest_failures.is_empty() {
            record_line.push_str(&format!(
                ", {} rejected at ingest",
                config.ingest_failures.len()
            ));
        }
        lines.push(format!("{}     {record_line}", self.color("Records:", "cyan")));
        lines.push(String::new());

        if report.record_count > 0 {
            let grade = QualityGrade::from_score(report.mean_percentage());
            lines.push(format!(
                "{}  {:.2} / {:.2}  ({:.1}%, grade {})",
                self.color("Mean score:", "bold"),
                dist.mean,
                report.max_score,
                report.mean_percentage(),
                self.color(grade.letter(), grade_color(grade))
            ));
            lines.push(format!("  Median  {:.2}", dist.median));
            lines.push(format!("  Range   {:.2} - {:.2}", dist.min, dist.max));

            let passed = format!(
                "{} of {} ({:.1}%)",
                report.passed_count,
                report.record_count,
                report.pass_rate() * 100.0
            );
            let pass_color = if report.failed_count == 0 { "green" } else { "yellow" };
            lines.push(format!("  Passed  {}", self.color(&passed, pass_color)));

            let grades = dist
                .grades
                .iter()
                .map(|g| format!("{} {}", g.grade.letter(), g.count))
                .collect::<Vec<_>>()
                .join("  ");
            lines.push(format!("  Grades  {grades}"));
        } else {
            lines.push(format!("  {}", self.color("No records scored", "dim")));
        }

        if !report.rule_failures.is_empty() {
            lines.push(String::new());
            lines.push(self.color("Rule failures:", "bold"));
            let width = report
                .rule_failures
                .iter()
                .map(|s| display_width(&s.rule_id))
                .max()
                .unwrap_or(0);
            for stat in &report.rule_failures {
                let rate = format!("{:>5.1}%", stat.rate * 100.0);
                lines.push(format!(
                    "  {}  {:>6}  {}",
                    pad(&stat.rule_id, width),
                    stat.failures,
                    self.color(&rate, rate_color(stat.rate))
                ));
            }
        }

        if !report.group_means.is_empty() {
            lines.push(String::new());
            lines.push(self.color("Groups:", "bold"));
            for group in &report.group_means {
                lines.push(format!("  {:<16} {:.2}", group.group, group.mean));
            }
        }

        if report.has_unscoreable() {
            lines.push(String::new());
            lines.push(self.color("Unscoreable records:", "red"));
            let shown = config.limit(report.unscoreable.len());
            for record in report.unscoreable.iter().take(shown) {
                lines.push(format!("  {}: {}", record.record_id, record.error));
            }
            if shown < report.unscoreable.len() {
                lines.push(self.color(
                    &format!("  ... and {} more", report.unscoreable.len() - shown),
                    "dim",
                ));
            }
        }

        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Summary
    }
}

/// Table reporter for terminal output with aligned columns
pub struct TableReporter {
    /// Use colored output
    colored: bool,
}

impl TableReporter {
    /// Create a new table reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }
}

impl Default for TableReporter {
    fn default() -> Self {
        Self::new()
    }
}

const ID_WIDTH: usize = 24;
const FAILED_WIDTH: usize = 40;

impl ReportGenerator for TableReporter {
    fn generate(
        &self,
        report: &AggregateReport,
        results: &[ScoreResult],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();

        // Colors are applied after padding so escape codes do not skew widths.
        lines.push(self.color(
            &format!(
                "{} {:>8} {:>7} {:<5} {:<6} {}",
                pad("RECORD", ID_WIDTH),
                "SCORE",
                "PCT",
                "GRADE",
                "PASS",
                "FAILED RULES"
            ),
            "bold",
        ));
        lines.push("─".repeat(ID_WIDTH + 36 + FAILED_WIDTH));

        let shown = config.limit(results.len());
        for result in results.iter().take(shown) {
            let grade = result.grade();
            let pass = if result.passed {
                self.color(&pad("yes", 6), "green")
            } else {
                self.color(&pad("no", 6), "red")
            };
            let failed = if result.failed.is_empty() {
                "-".to_string()
            } else {
                truncate(&result.failed.join(", "), FAILED_WIDTH)
            };
            lines.push(format!(
                "{} {:>8.2} {:>6.1}% {} {} {}",
                pad(&truncate(&result.record_id, ID_WIDTH), ID_WIDTH),
                result.score,
                result.percentage(),
                self.color(&pad(grade.letter(), 5), grade_color(grade)),
                pass,
                failed
            ));
        }
        if shown < results.len() {
            lines.push(self.color(
                &format!("... and {} more records", results.len() - shown),
                "dim",
            ));
        }

        for record in &report.unscoreable {
            lines.push(format!(
                "{} {}",
                pad(&truncate(&record.record_id, ID_WIDTH), ID_WIDTH),
                self.color(&format!("unscoreable: {}", record.error), "red")
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Total: {} scored, {} passed, {} failed | Unscoreable: {} | Excluded: {} | Mean: {:.1}%",
            report.record_count,
            report.passed_count,
            report.failed_count,
            report.unscoreable.len(),
            report.excluded_count,
            report.mean_percentage()
        ));

        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Table
    }
}

fn display_width(s: &str) -> usize {
    s.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Pad to a display width (wide characters count double).
fn pad(s: &str, width: usize) -> String {
    let current = display_width(s);
    if current >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - current))
    }
}

/// Truncate to a display width, marking the cut with "...".
fn truncate(s: &str, max_width: usize) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if max_width > 3 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::test_support::sample;

    #[test]
    fn test_summary_contents() {
        let (report, results) = sample();
        let output = SummaryReporter::new()
            .no_color()
            .generate(&report, &results, &ReportConfig::default())
            .expect("render");
        assert!(output.contains("Collection:  demo"));
        assert!(output.contains("2 scored"));
        assert!(output.contains("Mean score:  0.50 / 3.00"));
        assert!(output.contains("100.0%"));
        assert!(output.contains(" 50.0%"));
        assert!(!output.contains('\x1b'));
    }

    #[test]
    fn test_summary_colored() {
        let (report, results) = sample();
        let output = SummaryReporter::new()
            .generate(&report, &results, &ReportConfig::default())
            .expect("render");
        assert!(output.contains("\x1b[1m"));
    }

    #[test]
    fn test_table_rows() {
        let (report, results) = sample();
        let output = TableReporter::new()
            .no_color()
            .generate(&report, &results, &ReportConfig::default())
            .expect("render");
        let rows: Vec<&str> = output.lines().collect();
        assert!(rows[0].starts_with("RECORD"));
        assert!(rows[2].starts_with("A "));
        assert!(rows[2].contains("date"));
        assert!(rows[3].contains("title, date"));
        assert!(output.contains("Total: 2 scored, 0 passed, 2 failed"));
    }

    #[test]
    fn test_table_respects_max_items() {
        let (report, results) = sample();
        let config = ReportConfig {
            max_items: Some(1),
            ..ReportConfig::default()
        };
        let output = TableReporter::new()
            .no_color()
            .generate(&report, &results, &config)
            .expect("render");
        assert!(output.contains("... and 1 more records"));
    }

    #[test]
    fn test_truncate_and_pad() {
        assert_eq!(truncate("abcdefghij", 6), "abc...");
        assert_eq!(truncate("abc", 6), "abc");
        assert_eq!(pad("日本", 6), "日本  ");
        assert_eq!(truncate("日本語テキスト", 7), "日本...");
    }
}

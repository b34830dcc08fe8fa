//! CSV report generator.
//!
//! One row per scored record with a 1/0 column for every rule, group
//! sub-score columns and the totals, suitable for spreadsheet review.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::quality::{AggregateReport, ScoreResult};

/// CSV report generator.
pub struct CsvReporter;

impl CsvReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for CsvReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for CsvReporter {
    fn generate(
        &self,
        report: &AggregateReport,
        results: &[ScoreResult],
        _config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let rule_ids: Vec<&str> = report
            .rule_failures
            .iter()
            .map(|stat| stat.rule_id.as_str())
            .collect();
        let groups: Vec<&str> = report
            .group_means
            .iter()
            .map(|stat| stat.group.as_str())
            .collect();

        let mut header = vec!["record_id".to_string()];
        header.extend(rule_ids.iter().map(|id| csv_field(id)));
        header.extend(groups.iter().map(|g| csv_field(&format!("group:{g}"))));
        header.extend(
            ["score", "max_score", "normalized", "grade", "passed"]
                .iter()
                .map(|s| (*s).to_string()),
        );

        let mut content = header.join(",");
        content.push('\n');

        for result in results {
            let mut row = vec![csv_field(&result.record_id)];
            row.extend(rule_ids.iter().map(|id| {
                if result.failed_rule(id) { "0" } else { "1" }.to_string()
            }));
            row.extend(groups.iter().map(|g| {
                result
                    .group_scores
                    .get(*g)
                    .map_or_else(String::new, |v| format!("{v:.4}"))
            }));
            row.push(format_number(result.score));
            row.push(format_number(result.max_score));
            row.push(format!("{:.4}", result.normalized()));
            row.push(result.grade().letter().to_string());
            row.push(result.passed.to_string());
            content.push_str(&row.join(","));
            content.push('\n');
        }

        Ok(content)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Csv
    }
}

/// Quote a field per RFC 4180 when it contains a delimiter, quote or line
/// break; newlines are flattened to spaces.
fn csv_field(s: &str) -> String {
    let flattened = s.replace(['\r', '\n'], " ");
    if flattened.contains([',', '"']) || flattened != s {
        format!("\"{}\"", flattened.replace('"', "\"\""))
    } else {
        flattened
    }
}

/// Render integral weights without a fractional part.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::test_support::sample;

    #[test]
    fn test_rows() {
        let (report, results) = sample();
        let output = CsvReporter::new()
            .generate(&report, &results, &ReportConfig::default())
            .expect("render");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[0],
            "record_id,date,title,group:core,score,max_score,normalized,grade,passed"
        );
        assert_eq!(lines[1], "A,0,1,0.3333,1,3,0.3333,F,false");
        assert_eq!(lines[2], "B|pipe,0,0,0.0000,0,3,0.0000,F,false");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_csv_field_escaping() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two lines\"");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(1.5), "1.5");
    }
}

//! JSON report generator.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator, ReportMetadata};
use crate::parsers::IngestFailure;
use crate::quality::{AggregateReport, ScoreResult};
use serde::Serialize;

/// JSON report generator
pub struct JsonReporter {
    /// Pretty print output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: true }
    }

    /// Set pretty printing
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a ReportMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    aggregate: &'a AggregateReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<Vec<JsonRecord<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ingest_failures: Option<&'a [IngestFailure]>,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    #[serde(flatten)]
    result: &'a ScoreResult,
    normalized: f64,
    grade: &'static str,
}

impl ReportGenerator for JsonReporter {
    fn generate(
        &self,
        report: &AggregateReport,
        results: &[ScoreResult],
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let records = config.include_records.then(|| {
            results
                .iter()
                .take(config.limit(results.len()))
                .map(|result| JsonRecord {
                    result,
                    normalized: result.normalized(),
                    grade: result.grade().letter(),
                })
                .collect()
        });

        let document = JsonReport {
            metadata: &config.metadata,
            title: config.title.as_deref(),
            aggregate: report,
            records,
            ingest_failures: (!config.ingest_failures.is_empty())
                .then_some(config.ingest_failures.as_slice()),
        };

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(rendered)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::test_support::sample;
    use serde_json::Value;

    #[test]
    fn test_aggregate_fields() {
        let (report, results) = sample();
        let output = JsonReporter::new()
            .generate(&report, &results, &ReportConfig::default())
            .expect("render");
        let json: Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(json["aggregate"]["collection_id"], "demo");
        assert_eq!(json["aggregate"]["record_count"], 2);
        assert_eq!(json["aggregate"]["distribution"]["mean"], 0.5);
        assert!(json.get("records").is_none());
        assert!(json.get("ingest_failures").is_none());
    }

    #[test]
    fn test_records_included_on_request() {
        let (report, results) = sample();
        let output = JsonReporter::new()
            .pretty(false)
            .generate(&report, &results, &ReportConfig::with_records())
            .expect("render");
        assert!(!output.contains('\n'));
        let json: Value = serde_json::from_str(&output).expect("valid json");
        let records = json["records"].as_array().expect("records array");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["record_id"], "A");
        assert_eq!(records[0]["failed"][0], "date");
        assert_eq!(records[1]["grade"], "F");
    }
}

//! Record ingestion.
//!
//! Reads catalog records from JSON Lines or JSON array documents and turns
//! them into [`Record`]s. Entries that cannot be converted are skipped and
//! reported as [`IngestFailure`]s with their position in the input.
//!
//! ## Usage
//!
//! ```no_run
//! use metaqual::parsers::parse_records;
//! use std::path::Path;
//!
//! let parsed = parse_records(Path::new("records.jsonl")).unwrap();
//! println!("{} records, {} skipped", parsed.records.len(), parsed.failures.len());
//! ```
//!
//! [`Record`]: crate::model::Record

mod detection;
mod records;

pub use detection::{detect_layout, RecordLayout};
pub use records::{record_from_value, IngestFailure, ParsedRecords};

use crate::error::{ErrorContext, IngestErrorKind, QualityError, Result};
use std::path::Path;

/// Maximum record file size (512 MB).
const MAX_RECORD_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Read and parse a record file.
///
/// Returns an error if the file cannot be read, exceeds
/// [`MAX_RECORD_FILE_SIZE`], or has no recognizable layout.
pub fn parse_records(path: &Path) -> Result<ParsedRecords> {
    let metadata = std::fs::metadata(path).map_err(|e| QualityError::io(path, e))?;
    if metadata.len() > MAX_RECORD_FILE_SIZE {
        return Err(QualityError::ingest(
            path.display().to_string(),
            IngestErrorKind::UnsupportedLayout(format!(
                "file is {} MB, exceeding the {} MB limit",
                metadata.len() / (1024 * 1024),
                MAX_RECORD_FILE_SIZE / (1024 * 1024),
            )),
        ));
    }
    let content = std::fs::read_to_string(path).map_err(|e| QualityError::io(path, e))?;
    parse_records_str(&content).with_context(|| path.display().to_string())
}

/// Parse records from in-memory content.
///
/// Empty content yields an empty JSON Lines result rather than an error.
pub fn parse_records_str(content: &str) -> Result<ParsedRecords> {
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Ok(records::parse_json_lines(""));
    }

    let parsed = match detect_layout(content) {
        Some(RecordLayout::JsonArray) => records::parse_json_array(content)
            .map_err(|kind| QualityError::ingest("parsing JSON array", kind))?,
        Some(RecordLayout::JsonLines) => records::parse_json_lines(content),
        None => {
            return Err(QualityError::ingest(
                "detecting input layout",
                IngestErrorKind::UnsupportedLayout(
                    "expected JSON Lines or a JSON array of records".to_string(),
                ),
            ))
        }
    };

    tracing::debug!(
        layout = parsed.layout.name(),
        records = parsed.records.len(),
        failures = parsed.failures.len(),
        "records parsed"
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array_document() {
        let parsed = parse_records_str(r#"[{"id":"a","fields":{"title":"Moon"}}]"#).expect("ok");
        assert_eq!(parsed.layout, RecordLayout::JsonArray);
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_parse_lines_document() {
        let parsed = parse_records_str("{\"id\":\"a\"}\n{\"id\":\"b\"}\n").expect("ok");
        assert_eq!(parsed.layout, RecordLayout::JsonLines);
        assert_eq!(parsed.records.len(), 2);
        assert!(!parsed.has_failures());
    }

    #[test]
    fn test_empty_content() {
        let parsed = parse_records_str("  \n").expect("ok");
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn test_unknown_layout() {
        let err = parse_records_str("id,title\n1,Moon\n").unwrap_err();
        assert!(matches!(err, QualityError::Ingest { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_records(Path::new("/nonexistent/records.jsonl")).unwrap_err();
        assert!(matches!(err, QualityError::Io { .. }));
    }
}

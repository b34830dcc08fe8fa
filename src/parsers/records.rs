//! Conversion of JSON documents into [`Record`]s.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use super::detection::RecordLayout;
use crate::error::IngestErrorKind;
use crate::model::{FieldValue, Record};

/// An input entry that was skipped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    /// 1-based line number (JSON Lines) or element position (JSON array)
    pub line: usize,
    #[serde(serialize_with = "serialize_display")]
    pub reason: IngestErrorKind,
}

fn serialize_display<S: serde::Serializer>(
    reason: &IngestErrorKind,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// Records read from one input, plus everything that was skipped.
#[derive(Debug, Clone)]
pub struct ParsedRecords {
    pub layout: RecordLayout,
    pub records: Vec<Record>,
    pub failures: Vec<IngestFailure>,
}

impl ParsedRecords {
    fn new(layout: RecordLayout) -> Self {
        Self {
            layout,
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Accept a converted entry, rejecting ids seen earlier in the input.
    fn accept(
        &mut self,
        line: usize,
        converted: Result<Record, IngestErrorKind>,
        seen: &mut HashSet<String>,
    ) {
        let outcome = converted.and_then(|record| {
            if seen.insert(record.id().to_string()) {
                Ok(record)
            } else {
                Err(IngestErrorKind::DuplicateId(record.id().to_string()))
            }
        });
        match outcome {
            Ok(record) => self.records.push(record),
            Err(reason) => {
                tracing::warn!("Skipping entry {line}: {reason}");
                self.failures.push(IngestFailure { line, reason });
            }
        }
    }
}

/// Parse JSON Lines content. Blank lines are ignored.
pub(crate) fn parse_json_lines(content: &str) -> ParsedRecords {
    let mut parsed = ParsedRecords::new(RecordLayout::JsonLines);
    let mut seen = HashSet::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let converted = serde_json::from_str::<Value>(line)
            .map_err(|e| IngestErrorKind::InvalidJson(e.to_string()))
            .and_then(record_from_value);
        parsed.accept(index + 1, converted, &mut seen);
    }
    parsed
}

/// Parse a JSON array of records.
///
/// A document that is not valid JSON at all fails as a whole; individual
/// malformed elements are reported and skipped.
pub(crate) fn parse_json_array(content: &str) -> Result<ParsedRecords, IngestErrorKind> {
    let elements: Vec<Value> =
        serde_json::from_str(content).map_err(|e| IngestErrorKind::InvalidJson(e.to_string()))?;

    let mut parsed = ParsedRecords::new(RecordLayout::JsonArray);
    let mut seen = HashSet::new();
    for (index, element) in elements.into_iter().enumerate() {
        parsed.accept(index + 1, record_from_value(element), &mut seen);
    }
    Ok(parsed)
}

/// Convert one JSON object of shape `{"id": ..., "fields": {...}}`.
pub fn record_from_value(value: Value) -> Result<Record, IngestErrorKind> {
    let Value::Object(mut object) = value else {
        return Err(IngestErrorKind::UnsupportedLayout(format!(
            "expected a JSON object per record, found {}",
            json_kind(&value)
        )));
    };

    let id = match object.remove("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(IngestErrorKind::MissingId),
    };

    let fields = match object.remove("fields") {
        None | Some(Value::Null) => IndexMap::new(),
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(name, raw)| field_value(&name, raw).map(|v| (name, v)))
            .collect::<Result<IndexMap<_, _>, _>>()?,
        Some(other) => {
            return Err(IngestErrorKind::InvalidField {
                field: "fields".to_string(),
                message: format!("expected an object, found {}", json_kind(&other)),
            })
        }
    };

    Ok(Record::from_fields(id, fields))
}

fn field_value(name: &str, raw: Value) -> Result<FieldValue, IngestErrorKind> {
    match raw {
        Value::Null => Ok(FieldValue::Absent),
        Value::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Null => {}
                    scalar => values.push(scalar_text(name, scalar)?),
                }
            }
            Ok(FieldValue::List(values))
        }
        scalar => scalar_text(name, scalar).map(FieldValue::Text),
    }
}

fn scalar_text(name: &str, value: Value) -> Result<String, IngestErrorKind> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(IngestErrorKind::InvalidField {
            field: name.to_string(),
            message: format!("nested {} values are not supported", json_kind(&other)),
        }),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

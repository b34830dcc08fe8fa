//! Normalized catalog record.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a single metadata field.
///
/// The set of shapes is closed so that every predicate handles every
/// variant explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A single textual value (possibly empty)
    Text(String),
    /// A repeated field
    List(Vec<String>),
    /// The field is known to be missing
    #[default]
    Absent,
}

static ABSENT: FieldValue = FieldValue::Absent;

impl FieldValue {
    /// Shape name used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Absent => "absent",
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The single text value, if this is a `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// All raw values, in order. A `Text` yields one value, `Absent` none.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Text(s) => vec![s.as_str()],
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Absent => Vec::new(),
        }
    }

    /// Values with surrounding whitespace trimmed, blanks removed.
    #[must_use]
    pub fn non_blank_values(&self) -> Vec<&str> {
        self.values()
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// True when at least one value carries non-whitespace text.
    #[must_use]
    pub fn has_content(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::List(items) => items.iter().any(|v| !v.trim().is_empty()),
            Self::Absent => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "{}", items.join("; ")),
            Self::Absent => write!(f, "-"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// One catalog item's metadata.
///
/// Records are built once by ingestion and never mutated afterwards; the
/// builder methods consume `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: String,
    #[serde(default)]
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// Create a record from an existing field map.
    pub fn from_fields(id: impl Into<String>, fields: IndexMap<String, FieldValue>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Add (or replace) a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up a field. Fields the record does not carry read as `Absent`.
    #[must_use]
    pub fn field(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&ABSENT)
    }

    /// Whether the record explicitly carries the field (even as `Absent`).
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

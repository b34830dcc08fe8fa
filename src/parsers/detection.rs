//! Input layout detection for record files.

use serde::{Deserialize, Serialize};

/// How records are laid out in an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordLayout {
    /// One JSON object per line
    JsonLines,
    /// A single JSON array of objects
    JsonArray,
}

impl RecordLayout {
    /// Human-readable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::JsonLines => "JSON Lines",
            Self::JsonArray => "JSON array",
        }
    }
}

/// Detect the layout from the first non-whitespace byte.
///
/// Returns `None` for empty (or whitespace-only) content and for content
/// that starts with anything other than `[` or `{`.
#[must_use]
pub fn detect_layout(content: &str) -> Option<RecordLayout> {
    let first = content
        .trim_start_matches('\u{feff}')
        .bytes()
        .find(|b| !b.is_ascii_whitespace());

    let layout = match first {
        Some(b'[') => Some(RecordLayout::JsonArray),
        Some(b'{') => Some(RecordLayout::JsonLines),
        _ => None,
    };
    tracing::debug!(
        "Layout detection: {}",
        layout.map_or("unknown", |l| l.name())
    );
    layout
}

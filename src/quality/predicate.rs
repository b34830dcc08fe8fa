//! Rule predicates.
//!
//! [`PredicateSpec`] is the serializable form found in rubric files;
//! [`Predicate`] is the compiled form used during scoring (regexes built,
//! vocabularies hashed).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigError;
use crate::model::FieldValue;

/// Predicate as written in a rubric definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PredicateSpec {
    /// At least one value with non-whitespace text
    NonEmpty,
    /// A single text value matching a regular expression
    MatchesPattern { pattern: String },
    /// Every value drawn from a controlled vocabulary
    InVocabulary {
        values: Vec<String>,
        #[serde(default = "default_case_sensitive")]
        case_sensitive: bool,
    },
    /// At least `min` non-blank values
    MinCount { min: usize },
    /// At most `max` non-blank values
    MaxCount { max: usize },
    /// Exactly one non-blank value
    ExactlyOne,
    /// All values identical
    AllEqual,
    /// No value repeated
    Distinct,
    /// Every value at least `min` characters long
    MinLength { min: usize },
}

const fn default_case_sensitive() -> bool {
    true
}

impl PredicateSpec {
    /// Type name as used in rubric files.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::NonEmpty => "non-empty",
            Self::MatchesPattern { .. } => "matches-pattern",
            Self::InVocabulary { .. } => "in-vocabulary",
            Self::MinCount { .. } => "min-count",
            Self::MaxCount { .. } => "max-count",
            Self::ExactlyOne => "exactly-one",
            Self::AllEqual => "all-equal",
            Self::Distinct => "distinct",
            Self::MinLength { .. } => "min-length",
        }
    }
}

impl fmt::Display for PredicateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchesPattern { pattern } => write!(f, "matches-pattern /{pattern}/"),
            Self::InVocabulary {
                values,
                case_sensitive,
            } => {
                write!(f, "in-vocabulary ({} terms", values.len())?;
                if !case_sensitive {
                    write!(f, ", case-insensitive")?;
                }
                write!(f, ")")
            }
            Self::MinCount { min } => write!(f, "min-count {min}"),
            Self::MaxCount { max } => write!(f, "max-count {max}"),
            Self::MinLength { min } => write!(f, "min-length {min}"),
            other => write!(f, "{}", other.type_name()),
        }
    }
}

/// The value had a shape the predicate cannot evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

/// Compiled predicate.
#[derive(Debug, Clone)]
pub enum Predicate {
    NonEmpty,
    MatchesPattern(Regex),
    InVocabulary {
        terms: HashSet<String>,
        case_sensitive: bool,
    },
    MinCount(usize),
    MaxCount(usize),
    ExactlyOne,
    AllEqual,
    Distinct,
    MinLength(usize),
}

impl Predicate {
    /// Compile a predicate spec for the named rule.
    pub fn compile(spec: &PredicateSpec, rule_id: &str) -> Result<Self, ConfigError> {
        let predicate = match spec {
            PredicateSpec::NonEmpty => Self::NonEmpty,
            PredicateSpec::MatchesPattern { pattern } => {
                let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                    rule: rule_id.to_string(),
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                Self::MatchesPattern(regex)
            }
            PredicateSpec::InVocabulary {
                values,
                case_sensitive,
            } => {
                let terms: HashSet<String> = values
                    .iter()
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(|v| normalize_term(v, *case_sensitive))
                    .collect();
                if terms.is_empty() {
                    return Err(ConfigError::EmptyVocabulary {
                        rule: rule_id.to_string(),
                    });
                }
                Self::InVocabulary {
                    terms,
                    case_sensitive: *case_sensitive,
                }
            }
            PredicateSpec::MinCount { min } => {
                if *min == 0 {
                    return Err(ConfigError::InvalidArgument {
                        rule: rule_id.to_string(),
                        message: "min-count of 0 always passes; use a positive minimum".to_string(),
                    });
                }
                Self::MinCount(*min)
            }
            PredicateSpec::MaxCount { max } => Self::MaxCount(*max),
            PredicateSpec::ExactlyOne => Self::ExactlyOne,
            PredicateSpec::AllEqual => Self::AllEqual,
            PredicateSpec::Distinct => Self::Distinct,
            PredicateSpec::MinLength { min } => {
                if *min == 0 {
                    return Err(ConfigError::InvalidArgument {
                        rule: rule_id.to_string(),
                        message: "min-length must be at least 1".to_string(),
                    });
                }
                Self::MinLength(*min)
            }
        };
        Ok(predicate)
    }

    /// Evaluate the predicate against a field value.
    ///
    /// An `Absent` value fails every predicate. Only shape problems are
    /// reported as errors.
    pub fn evaluate(&self, value: &FieldValue) -> Result<bool, ShapeMismatch> {
        if value.is_absent() {
            return Ok(false);
        }

        let passed = match self {
            Self::NonEmpty => value.has_content(),
            Self::MatchesPattern(regex) => match value {
                FieldValue::Text(text) => regex.is_match(text),
                other => {
                    return Err(ShapeMismatch {
                        expected: "text",
                        found: other.kind_name(),
                    });
                }
            },
            Self::InVocabulary {
                terms,
                case_sensitive,
            } => {
                let values = value.non_blank_values();
                !values.is_empty()
                    && values
                        .iter()
                        .all(|v| terms.contains(&normalize_term(v, *case_sensitive)))
            }
            Self::MinCount(min) => value.non_blank_values().len() >= *min,
            Self::MaxCount(max) => value.non_blank_values().len() <= *max,
            Self::ExactlyOne => value.non_blank_values().len() == 1,
            Self::AllEqual => {
                let values = value.non_blank_values();
                values.first().is_some_and(|first| values.iter().all(|v| v == first))
            }
            Self::Distinct => {
                let values = value.non_blank_values();
                let mut seen = HashSet::with_capacity(values.len());
                !values.is_empty() && values.iter().all(|v| seen.insert(*v))
            }
            Self::MinLength(min) => {
                let values = value.values();
                !values.is_empty() && values.iter().all(|v| v.trim().chars().count() >= *min)
            }
        };
        Ok(passed)
    }
}

fn normalize_term(term: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        term.to_string()
    } else {
        term.to_lowercase()
    }
}

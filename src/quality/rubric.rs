//! Rubric definitions and loading.
//!
//! A rubric is an ordered list of mandatory-field rules. Definitions are
//! read from YAML or JSON and validated once; the resulting [`Rubric`] is
//! immutable and shared by reference across scoring workers.
//!
//! ```yaml
//! name: minimum-mandatory
//! pass_threshold: 1.0
//! exclusions:
//!   - field: collection
//!     values: ["25778"]
//!     reason: out of audit scope
//! rules:
//!   - id: title_1
//!     field: title
//!     group: title
//!     predicate: { type: non-empty }
//!   - id: date_2
//!     field: date
//!     weight: 2
//!     requires: [title_1]
//!     predicate: { type: matches-pattern, pattern: "^\\d{4}" }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::predicate::{Predicate, PredicateSpec};
use crate::error::{ConfigError, ErrorContext, QualityError};
use crate::model::Record;
use crate::utils::{content_hash, format_fingerprint};

// ============================================================================
// Definitions (file format)
// ============================================================================

/// A single rule as written in a rubric file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Rule identifier; defaults to the field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Field the rule inspects
    pub field: String,
    /// Predicate applied to the field
    pub predicate: PredicateSpec,
    /// Points awarded when the rule passes
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Optional group label for sub-scores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Rules that must pass for this one to be evaluated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

const fn default_weight() -> f64 {
    1.0
}

impl RuleDefinition {
    /// Create a rule definition with weight 1 whose id is the field name.
    pub fn new(field: impl Into<String>, predicate: PredicateSpec) -> Self {
        Self {
            id: None,
            field: field.into(),
            predicate,
            weight: default_weight(),
            group: None,
            requires: Vec::new(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn requires(mut self, rule_id: impl Into<String>) -> Self {
        self.requires.push(rule_id.into());
        self
    }

    /// The identifier this rule will be known by.
    #[must_use]
    pub fn resolved_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.field)
    }
}

/// Skip records whose field holds one of the listed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionDefinition {
    pub field: String,
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Root of a rubric file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Minimum fraction of the maximum score a record needs to pass
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<ExclusionDefinition>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

const fn default_pass_threshold() -> f64 {
    1.0
}

impl Default for RubricDefinition {
    fn default() -> Self {
        Self {
            name: None,
            pass_threshold: default_pass_threshold(),
            exclusions: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl RubricDefinition {
    /// Parse a definition from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Syntax(e.to_string()))
    }

    /// Parse a definition from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Syntax(e.to_string()))
    }

    /// Read a definition file; `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn from_file(path: &Path) -> Result<Self, QualityError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| QualityError::io(path, e))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        };
        parsed.with_context(|| format!("reading {}", path.display()))
    }
}

// ============================================================================
// Compiled rubric
// ============================================================================

/// A validated scoring rule.
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    field: String,
    spec: PredicateSpec,
    predicate: Predicate,
    weight: f64,
    group: Option<String>,
    requires: Vec<usize>,
    description: Option<String>,
}

impl Rule {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[must_use]
    pub const fn spec(&self) -> &PredicateSpec {
        &self.spec
    }

    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Positions (in rubric order) of the rules this one depends on.
    #[must_use]
    pub fn prerequisites(&self) -> &[usize] {
        &self.requires
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A compiled exclusion filter.
#[derive(Debug, Clone)]
pub struct Exclusion {
    field: String,
    values: HashSet<String>,
    reason: Option<String>,
}

impl Exclusion {
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Whether the record carries any excluded value in the field.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        record
            .field(&self.field)
            .non_blank_values()
            .iter()
            .any(|v| self.values.contains(*v))
    }

    /// Short description for logs and reports.
    #[must_use]
    pub fn describe(&self) -> String {
        self.reason
            .clone()
            .unwrap_or_else(|| format!("excluded by field '{}'", self.field))
    }
}

/// An immutable, validated set of rules.
#[derive(Debug, Clone)]
pub struct Rubric {
    name: Option<String>,
    rules: Vec<Rule>,
    exclusions: Vec<Exclusion>,
    pass_threshold: f64,
    total_weight: f64,
    groups: IndexMap<String, f64>,
    fingerprint: String,
}

impl Rubric {
    /// Build a rubric from rule definitions with default settings.
    ///
    /// Fails if two rules share an id or any weight is negative.
    pub fn load(rules: Vec<RuleDefinition>) -> Result<Self, ConfigError> {
        Self::from_definition(RubricDefinition {
            rules,
            ..RubricDefinition::default()
        })
    }

    /// Build a rubric from a full definition.
    pub fn from_definition(definition: RubricDefinition) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&definition.pass_threshold) {
            return Err(ConfigError::InvalidThreshold(definition.pass_threshold));
        }

        let fingerprint = serde_json::to_vec(&definition)
            .map(|bytes| format_fingerprint(content_hash(&bytes)))
            .map_err(|e| ConfigError::Syntax(e.to_string()))?;

        let mut positions: IndexMap<String, usize> = IndexMap::new();
        let mut rules = Vec::with_capacity(definition.rules.len());
        let mut groups: IndexMap<String, f64> = IndexMap::new();

        for (index, def) in definition.rules.into_iter().enumerate() {
            if def.field.trim().is_empty() {
                return Err(ConfigError::EmptyName {
                    index,
                    what: "field name",
                });
            }
            let id = def.resolved_id().to_string();
            if id.trim().is_empty() {
                return Err(ConfigError::EmptyName { index, what: "id" });
            }
            if positions.contains_key(&id) {
                return Err(ConfigError::DuplicateRuleId(id));
            }
            if !def.weight.is_finite() || def.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    rule: id,
                    weight: def.weight,
                });
            }

            let requires = def
                .requires
                .iter()
                .map(|dep| {
                    positions
                        .get(dep)
                        .copied()
                        .ok_or_else(|| ConfigError::UnknownPrerequisite {
                            rule: id.clone(),
                            requires: dep.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let predicate = Predicate::compile(&def.predicate, &id)?;

            if let Some(group) = &def.group {
                *groups.entry(group.clone()).or_insert(0.0) += def.weight;
            }

            positions.insert(id.clone(), index);
            rules.push(Rule {
                id,
                field: def.field,
                spec: def.predicate,
                predicate,
                weight: def.weight,
                group: def.group,
                requires,
                description: def.description,
            });
        }

        let exclusions = definition
            .exclusions
            .into_iter()
            .enumerate()
            .map(|(index, ex)| compile_exclusion(index, ex))
            .collect::<Result<Vec<_>, _>>()?;

        let total_weight = rules.iter().map(|r| r.weight).sum();

        tracing::debug!(
            rules = rules.len(),
            exclusions = exclusions.len(),
            total_weight,
            "rubric compiled"
        );

        Ok(Self {
            name: definition.name,
            rules,
            exclusions,
            pass_threshold: definition.pass_threshold,
            total_weight,
            groups,
            fingerprint,
        })
    }

    /// Load and compile a rubric file (YAML or JSON).
    pub fn from_file(path: &Path) -> Result<Self, QualityError> {
        let definition = RubricDefinition::from_file(path)?;
        Self::from_definition(definition).with_context(|| format!("compiling {}", path.display()))
    }

    /// Rules in definition order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by id.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sum of all rule weights; the highest score a record can reach.
    #[must_use]
    pub const fn total_weight(&self) -> f64 {
        self.total_weight
    }

    #[must_use]
    pub const fn pass_threshold(&self) -> f64 {
        self.pass_threshold
    }

    /// Group labels in first-appearance order with their total weight.
    pub fn groups(&self) -> impl Iterator<Item = (&str, f64)> {
        self.groups.iter().map(|(g, w)| (g.as_str(), *w))
    }

    #[must_use]
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// The first exclusion filter the record matches, if any.
    #[must_use]
    pub fn exclusion_for(&self, record: &Record) -> Option<&Exclusion> {
        self.exclusions.iter().find(|ex| ex.matches(record))
    }

    /// Stable digest of the definition this rubric was built from.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Rule ids in definition order.
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }
}

fn compile_exclusion(index: usize, def: ExclusionDefinition) -> Result<Exclusion, ConfigError> {
    if def.field.trim().is_empty() {
        return Err(ConfigError::InvalidExclusion {
            index,
            message: "field name is empty".to_string(),
        });
    }
    let values: HashSet<String> = def
        .values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        return Err(ConfigError::InvalidExclusion {
            index,
            message: format!("no values listed for field '{}'", def.field),
        });
    }
    Ok(Exclusion {
        field: def.field,
        values,
        reason: def.reason,
    })
}

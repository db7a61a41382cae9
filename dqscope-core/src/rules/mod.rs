//! Rule model, compilation and persistence.
//!
//! A [`Rule`] is the declarative, serializable form a user edits. Compiling
//! it yields a [`CompiledRule`]: either a per-row [`Predicate`] or a
//! dataset-scoped [`DatasetCheck`] (uniqueness, cadence). Compilation is
//! derived on demand and never stored.
//!
//! # Example
//! ```rust
//! use dqscope_core::rules::{ConditionType, Rule};
//! use dqscope_core::SemanticType;
//!
//! let rule = Rule::new("age", ConditionType::Range)
//!     .with_data_type(SemanticType::Numeric)
//!     .with_param("min", 0)
//!     .with_param("max", 120);
//! let compiled = rule.compile().unwrap();
//! assert!(compiled.passes(Some("42"), 0.0));
//! assert!(!compiled.passes(Some("-1"), 0.0));
//! ```

mod condition;
mod dimension;
mod document;
mod equality;
pub(crate) mod params;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DqError, Result};
use crate::inference::SemanticType;

pub use condition::{CompiledRule, DatasetCheck, Predicate, RuleKind};
pub use dimension::{QualityDimension, map_rule_to_dimension};
pub use document::{
    RULES_FORMAT_VERSION, ValidationError, export_rules, import_rules, initialize_rules_validator,
    validate_rules_document,
};
pub use equality::{is_suggestion_implemented, rule_equals, rules_contain};

/// Supported condition types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ConditionType {
    /// Value present and non-empty
    NotEmpty,
    /// Text length at most `maxLength`
    MaxLength,
    /// Equality, interpreted by the rule's data type
    Equals,
    /// Unanchored regular-expression search
    RegexMatch,
    /// Inclusive numeric range
    Range,
    /// Inclusive lexicographic date range
    DateRange,
    /// Inclusive lexicographic time range
    TimeRange,
    /// Inclusive parsed-timestamp range
    DatetimeRange,
    /// Strictly greater than
    GreaterThan,
    /// Strictly less than
    LessThan,
    /// true/yes/1
    IsTrue,
    /// false/no/0
    IsFalse,
    /// No duplicate values in the column
    Unique,
    /// Value belongs to an allow-list
    ClassMatch,
    /// Timestamp no older than a window
    FreshnessWithin,
    /// Consecutive timestamps no further apart than a window
    CadenceWithin,
}

impl ConditionType {
    /// Every condition type, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::NotEmpty,
        Self::MaxLength,
        Self::Equals,
        Self::RegexMatch,
        Self::Range,
        Self::DateRange,
        Self::TimeRange,
        Self::DatetimeRange,
        Self::GreaterThan,
        Self::LessThan,
        Self::IsTrue,
        Self::IsFalse,
        Self::Unique,
        Self::ClassMatch,
        Self::FreshnessWithin,
        Self::CadenceWithin,
    ];

    /// Wire name (camelCase).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotEmpty => "notEmpty",
            Self::MaxLength => "maxLength",
            Self::Equals => "equals",
            Self::RegexMatch => "regexMatch",
            Self::Range => "range",
            Self::DateRange => "dateRange",
            Self::TimeRange => "timeRange",
            Self::DatetimeRange => "datetimeRange",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::IsTrue => "isTrue",
            Self::IsFalse => "isFalse",
            Self::Unique => "unique",
            Self::ClassMatch => "classMatch",
            Self::FreshnessWithin => "freshnessWithin",
            Self::CadenceWithin => "cadenceWithin",
        }
    }

    /// Returns true for checks evaluated over the whole column at once.
    pub const fn is_dataset_scoped(self) -> bool {
        matches!(self, Self::Unique | Self::CadenceWithin)
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionType {
    type Err = DqError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DqError::unknown_condition_type(s))
    }
}

impl TryFrom<String> for ConditionType {
    type Error = DqError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ConditionType> for &'static str {
    fn from(value: ConditionType) -> Self {
        value.as_str()
    }
}

/// A user-declared data-quality rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Column the rule applies to
    pub column: String,
    /// Declared semantic type; drives `equals` and the dimension mapping
    #[serde(default)]
    pub data_type: SemanticType,
    /// Condition to check
    pub condition_type: ConditionType,
    /// Condition parameters (`min`, `max`, `value`, `pattern`, `values`,
    /// `unit`, `tolerance`, `maxLength`)
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Rule {
    /// Creates a string-typed rule with no parameters.
    pub fn new(column: impl Into<String>, condition_type: ConditionType) -> Self {
        Self {
            column: column.into(),
            data_type: SemanticType::String,
            condition_type,
            params: Map::new(),
        }
    }

    /// Creates a rule from a condition type name, failing fast on unknown names.
    pub fn from_parts(
        column: impl Into<String>,
        data_type: SemanticType,
        condition_type: &str,
        params: Map<String, Value>,
    ) -> Result<Self> {
        Ok(Self {
            column: column.into(),
            data_type,
            condition_type: condition_type.parse()?,
            params,
        })
    }

    /// Builder method to set the declared data type.
    #[must_use]
    pub fn with_data_type(mut self, data_type: SemanticType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Builder method to set one parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Breakdown label, `[column] conditionType`.
    pub fn label(&self) -> String {
        format!("[{}] {}", self.column, self.condition_type)
    }

    /// Compiles the rule; see [`CompiledRule`].
    ///
    /// # Errors
    /// Returns [`DqError::InertRule`] when parameters are missing or invalid.
    pub fn compile(&self) -> Result<CompiledRule> {
        condition::compile(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_type_names_round_trip() {
        for ct in ConditionType::ALL {
            assert_eq!(ct.as_str().parse::<ConditionType>().unwrap(), ct);
        }
    }

    #[test]
    fn test_unknown_condition_type_fails_fast() {
        let err = "between".parse::<ConditionType>().unwrap_err();
        assert!(matches!(err, DqError::UnknownConditionType { ref name } if name == "between"));

        let err = Rule::from_parts("a", SemanticType::String, "fuzzy", Map::new()).unwrap_err();
        assert!(err.to_string().contains("Unknown condition type: fuzzy"));
    }

    #[test]
    fn test_rule_serde_shape() {
        let rule = Rule::new("age", ConditionType::GreaterThan)
            .with_data_type(SemanticType::Integer)
            .with_param("value", 18);
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            value,
            json!({
                "column": "age",
                "dataType": "integer",
                "conditionType": "greaterThan",
                "params": {"value": 18}
            })
        );
        let back: Rule = serde_json::from_value(value).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn test_rule_deserialize_unknown_condition() {
        let err = serde_json::from_value::<Rule>(json!({
            "column": "a",
            "conditionType": "soundsLike"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Unknown condition type: soundsLike"));
    }

    #[test]
    fn test_rule_defaults() {
        let rule: Rule = serde_json::from_value(json!({
            "column": "id",
            "conditionType": "unique"
        }))
        .unwrap();
        assert_eq!(rule.data_type, SemanticType::String);
        assert!(rule.params.is_empty());
        assert_eq!(rule.label(), "[id] unique");
        assert!(rule.condition_type.is_dataset_scoped());
    }
}

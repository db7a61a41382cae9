//! Quality dimension classification of rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::{DatasetCheck, Predicate, RuleKind};
use super::{ConditionType, Rule};

/// Editorial classification of what a rule guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityDimension {
    /// Values are present
    Completeness,
    /// Values are numerically plausible
    Accuracy,
    /// Values agree with an allowed vocabulary
    Consistency,
    /// Values are recent or arrive on schedule
    Timeliness,
    /// Values do not repeat
    Uniqueness,
    /// Values have the expected shape
    Validity,
}

impl QualityDimension {
    /// Every dimension, in display order.
    pub const ALL: [Self; 6] = [
        Self::Completeness,
        Self::Accuracy,
        Self::Consistency,
        Self::Timeliness,
        Self::Uniqueness,
        Self::Validity,
    ];

    /// Display name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completeness => "Completeness",
            Self::Accuracy => "Accuracy",
            Self::Consistency => "Consistency",
            Self::Timeliness => "Timeliness",
            Self::Uniqueness => "Uniqueness",
            Self::Validity => "Validity",
        }
    }
}

impl fmt::Display for QualityDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assigns a rule to exactly one quality dimension, first match wins.
///
/// Order: empty check, numeric coercion, regex, temporal parsing or a
/// temporal data type, unique, class match, then Validity.
pub fn map_rule_to_dimension(rule: &Rule, kind: &RuleKind) -> QualityDimension {
    if rule.condition_type == ConditionType::NotEmpty {
        return QualityDimension::Completeness;
    }
    match kind {
        RuleKind::Row(p) if p.is_numeric() => return QualityDimension::Accuracy,
        RuleKind::Row(Predicate::RegexMatch { .. }) => return QualityDimension::Validity,
        RuleKind::Row(p) if p.parses_timestamps() => return QualityDimension::Timeliness,
        RuleKind::Dataset(DatasetCheck::Cadence { .. }) => return QualityDimension::Timeliness,
        _ => {}
    }
    if rule.data_type.is_temporal() {
        return QualityDimension::Timeliness;
    }
    match rule.condition_type {
        ConditionType::Unique => QualityDimension::Uniqueness,
        ConditionType::ClassMatch => QualityDimension::Consistency,
        _ => QualityDimension::Validity,
    }
}

//! Compilation of rules into typed predicates and dataset checks.

use std::collections::BTreeSet;

use regex::Regex;

use super::dimension::{QualityDimension, map_rule_to_dimension};
use super::params::{self, DEFAULT_CADENCE_TOLERANCE};
use super::{ConditionType, Rule};
use crate::error::{DqError, Result};
use crate::inference::{SemanticType, parse_number};
use crate::models::is_missing;
use crate::temporal::{TimeUnit, parse_datetime_to_ms};

/// Per-row check over a single cell value.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Present and non-empty
    NotEmpty,
    /// Present with at most this many characters
    MaxLength(f64),
    /// Exact text equality
    EqualsText(String),
    /// Numeric equality
    EqualsNumber(f64),
    /// Parsed timestamp equality (epoch ms)
    EqualsDateTime(f64),
    /// Case-insensitive equality with `true`/`false`
    EqualsBool(bool),
    /// Unanchored regex search; `regex` is `None` when the pattern is invalid
    /// and then every row fails
    RegexMatch {
        /// Source pattern
        pattern: String,
        /// Compiled form
        regex: Option<Regex>,
    },
    /// Inclusive numeric range
    NumericRange {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// Inclusive lexicographic range over `YYYY-MM-DD` text
    DateRange {
        /// Lower bound
        min: String,
        /// Upper bound
        max: String,
    },
    /// Inclusive lexicographic range over `HH:MM[:SS]` text
    TimeRange {
        /// Lower bound
        min: String,
        /// Upper bound
        max: String,
    },
    /// Inclusive range over parsed timestamps (epoch ms)
    DateTimeRange {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// Strictly greater than
    GreaterThan(f64),
    /// Strictly less than
    LessThan(f64),
    /// true/yes/1
    IsTrue,
    /// false/no/0
    IsFalse,
    /// Allow-list membership
    ClassMatch(BTreeSet<String>),
    /// `now - timestamp <= window_ms`
    FreshnessWithin {
        /// Window length
        window_ms: f64,
    },
}

impl Predicate {
    /// Evaluates the predicate against one cell.
    ///
    /// Numeric checks read a missing or blank cell as 0 and regex checks read
    /// a missing cell as `null`. Every other check fails on a missing cell,
    /// except `maxLength` on an empty string. `now_ms` is only read by
    /// freshness checks.
    pub fn evaluate(&self, value: Option<&str>, now_ms: f64) -> bool {
        match self {
            Self::NotEmpty => !is_missing(value),
            Self::MaxLength(limit) => value.is_some_and(|v| v.chars().count() as f64 <= *limit),
            Self::RegexMatch { regex, .. } => regex
                .as_ref()
                .is_some_and(|re| re.is_match(value.unwrap_or("null"))),
            Self::EqualsNumber(_)
            | Self::NumericRange { .. }
            | Self::GreaterThan(_)
            | Self::LessThan(_) => coerce_number(value).is_some_and(|n| self.compare_number(n)),
            _ => value.is_some_and(|v| self.evaluate_present(v, now_ms)),
        }
    }

    fn compare_number(&self, n: f64) -> bool {
        match self {
            Self::EqualsNumber(expected) => n == *expected,
            Self::NumericRange { min, max } => n >= *min && n <= *max,
            Self::GreaterThan(bound) => n > *bound,
            Self::LessThan(bound) => n < *bound,
            _ => false,
        }
    }

    fn evaluate_present(&self, v: &str, now_ms: f64) -> bool {
        match self {
            Self::NotEmpty
            | Self::MaxLength(_)
            | Self::RegexMatch { .. }
            | Self::EqualsNumber(_)
            | Self::NumericRange { .. }
            | Self::GreaterThan(_)
            | Self::LessThan(_) => self.evaluate(Some(v), now_ms),
            Self::EqualsText(expected) => v == expected,
            Self::EqualsDateTime(expected) => {
                parse_datetime_to_ms(v).is_some_and(|t| t == *expected)
            }
            Self::EqualsBool(expected) => v.to_lowercase() == expected.to_string(),
            Self::DateRange { min, max } | Self::TimeRange { min, max } => {
                v >= min.as_str() && v <= max.as_str()
            }
            Self::DateTimeRange { min, max } => {
                parse_datetime_to_ms(v).is_some_and(|t| t >= *min && t <= *max)
            }
            Self::IsTrue => matches!(v.to_lowercase().as_str(), "true" | "yes" | "1"),
            Self::IsFalse => matches!(v.to_lowercase().as_str(), "false" | "no" | "0"),
            Self::ClassMatch(allowed) => allowed.contains(v),
            Self::FreshnessWithin { window_ms } => {
                parse_datetime_to_ms(v).is_some_and(|t| now_ms - t <= *window_ms)
            }
        }
    }

    /// Returns true if the predicate coerces values to numbers.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::NumericRange { .. }
                | Self::GreaterThan(_)
                | Self::LessThan(_)
                | Self::EqualsNumber(_)
        )
    }

    /// Returns true if the predicate parses values as timestamps.
    pub const fn parses_timestamps(&self) -> bool {
        matches!(
            self,
            Self::EqualsDateTime(_) | Self::DateTimeRange { .. } | Self::FreshnessWithin { .. }
        )
    }
}

/// Numeric reading of a cell; missing and blank cells read as 0.
fn coerce_number(value: Option<&str>) -> Option<f64> {
    match value.map(str::trim) {
        None | Some("") => Some(0.0),
        Some(v) => parse_number(v),
    }
}

/// Column-wide check that needs every row at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatasetCheck {
    /// Every occurrence of a repeated raw value fails
    Unique,
    /// Rows following a gap wider than `max_allowed_ms` fail
    Cadence {
        /// Widest tolerated gap between consecutive timestamps
        max_allowed_ms: f64,
    },
}

/// Per-row or dataset-scoped evaluation strategy.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Evaluated cell by cell
    Row(Predicate),
    /// Evaluated over the whole column
    Dataset(DatasetCheck),
}

/// A rule ready for evaluation.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Column the rule reads
    pub column: String,
    /// Breakdown label, `[column] conditionType`
    pub label: String,
    /// Quality dimension the rule scores against
    pub dimension: QualityDimension,
    /// Evaluation strategy
    pub kind: RuleKind,
}

impl CompiledRule {
    /// Evaluates a per-row rule against one cell.
    ///
    /// Dataset-scoped rules have no per-cell meaning and always pass here;
    /// the engine evaluates them over the full column.
    pub fn passes(&self, value: Option<&str>, now_ms: f64) -> bool {
        match &self.kind {
            RuleKind::Row(predicate) => predicate.evaluate(value, now_ms),
            RuleKind::Dataset(_) => true,
        }
    }
}

fn require<T>(rule: &Rule, value: Option<T>, reason: &str) -> Result<T> {
    value.ok_or_else(|| DqError::inert_rule(&rule.column, rule.condition_type.as_str(), reason))
}

fn compile_equals(rule: &Rule) -> Result<Predicate> {
    let p = &rule.params;
    match rule.data_type {
        SemanticType::Numeric | SemanticType::Integer => Ok(Predicate::EqualsNumber(require(
            rule,
            params::number(p, "value"),
            "'value' must be a number",
        )?)),
        SemanticType::Datetime => {
            let raw = require(rule, params::text(p, "value"), "missing 'value'")?;
            Ok(Predicate::EqualsDateTime(require(
                rule,
                parse_datetime_to_ms(&raw),
                "'value' is not a datetime",
            )?))
        }
        SemanticType::Boolean => {
            let raw = require(rule, params::text(p, "value"), "missing 'value'")?;
            match raw.to_lowercase().as_str() {
                "true" => Ok(Predicate::EqualsBool(true)),
                "false" => Ok(Predicate::EqualsBool(false)),
                _ => Err(DqError::inert_rule(
                    &rule.column,
                    "equals",
                    "'value' must be true or false",
                )),
            }
        }
        SemanticType::String | SemanticType::Date | SemanticType::Time => Ok(
            Predicate::EqualsText(require(rule, params::text(p, "value"), "missing 'value'")?),
        ),
    }
}

fn compile_predicate(rule: &Rule) -> Result<Predicate> {
    let p = &rule.params;
    let predicate = match rule.condition_type {
        ConditionType::NotEmpty => Predicate::NotEmpty,
        ConditionType::MaxLength => {
            let limit = require(
                rule,
                params::number(p, "maxLength").filter(|n| *n > 0.0),
                "'maxLength' must be a positive number",
            )?;
            Predicate::MaxLength(limit)
        }
        ConditionType::Equals => compile_equals(rule)?,
        ConditionType::RegexMatch => {
            let pattern = require(
                rule,
                params::text(p, "pattern").filter(|s| !s.trim().is_empty()),
                "missing 'pattern'",
            )?;
            let regex = match Regex::new(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(
                        "Invalid pattern for {}: {}; every row will fail",
                        rule.label(),
                        e
                    );
                    None
                }
            };
            Predicate::RegexMatch { pattern, regex }
        }
        ConditionType::Range => Predicate::NumericRange {
            min: require(rule, params::number(p, "min"), "'min' must be a number")?,
            max: require(rule, params::number(p, "max"), "'max' must be a number")?,
        },
        ConditionType::DateRange => Predicate::DateRange {
            min: require(rule, params::text(p, "min"), "missing 'min'")?,
            max: require(rule, params::text(p, "max"), "missing 'max'")?,
        },
        ConditionType::TimeRange => Predicate::TimeRange {
            min: require(rule, params::text(p, "min"), "missing 'min'")?,
            max: require(rule, params::text(p, "max"), "missing 'max'")?,
        },
        ConditionType::DatetimeRange => {
            let min = require(rule, params::text(p, "min"), "missing 'min'")?;
            let max = require(rule, params::text(p, "max"), "missing 'max'")?;
            Predicate::DateTimeRange {
                min: require(rule, parse_datetime_to_ms(&min), "'min' is not a datetime")?,
                max: require(rule, parse_datetime_to_ms(&max), "'max' is not a datetime")?,
            }
        }
        ConditionType::GreaterThan => Predicate::GreaterThan(require(
            rule,
            params::number(p, "value"),
            "'value' must be a number",
        )?),
        ConditionType::LessThan => Predicate::LessThan(require(
            rule,
            params::number(p, "value"),
            "'value' must be a number",
        )?),
        ConditionType::IsTrue => Predicate::IsTrue,
        ConditionType::IsFalse => Predicate::IsFalse,
        ConditionType::ClassMatch => Predicate::ClassMatch(
            require(rule, params::string_list(p, "values"), "'values' is empty")?
                .into_iter()
                .collect(),
        ),
        ConditionType::FreshnessWithin => {
            let (value, unit) = window(rule)?;
            Predicate::FreshnessWithin {
                window_ms: value * unit.millis(),
            }
        }
        ConditionType::Unique | ConditionType::CadenceWithin => {
            return Err(DqError::inert_rule(
                &rule.column,
                rule.condition_type.as_str(),
                "dataset-scoped condition has no per-row predicate",
            ));
        }
    };
    Ok(predicate)
}

/// Reads a non-zero `value` and a non-empty `unit`.
fn window(rule: &Rule) -> Result<(f64, TimeUnit)> {
    let value = require(
        rule,
        params::number(&rule.params, "value").filter(|v| *v != 0.0),
        "'value' must be a non-zero number",
    )?;
    let unit = require(rule, params::text(&rule.params, "unit"), "missing 'unit'")?;
    Ok((value, TimeUnit::window_unit(&unit)))
}

pub(super) fn compile(rule: &Rule) -> Result<CompiledRule> {
    let kind = match rule.condition_type {
        ConditionType::Unique => RuleKind::Dataset(DatasetCheck::Unique),
        ConditionType::CadenceWithin => {
            let (value, unit) = window(rule)?;
            let tolerance = params::tolerance(&rule.params);
            let multiplier = if tolerance.is_finite() && tolerance > 0.0 {
                tolerance
            } else {
                DEFAULT_CADENCE_TOLERANCE
            };
            RuleKind::Dataset(DatasetCheck::Cadence {
                max_allowed_ms: (value * unit.millis()).max(0.0) * multiplier,
            })
        }
        _ => RuleKind::Row(compile_predicate(rule)?),
    };
    Ok(CompiledRule {
        column: rule.column.clone(),
        label: rule.label(),
        dimension: map_rule_to_dimension(rule, &kind),
        kind,
    })
}

//! Semantic rule comparison, used to hide suggestions that are already in place.

use std::collections::BTreeSet;

use super::params;
use super::{ConditionType, Rule};

const RANGE_TOLERANCE: f64 = 1e-9;

fn same_number(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

fn same_bound(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if (x - y).abs() < RANGE_TOLERANCE)
}

fn same_text(existing: &Rule, proposed: &Rule, key: &str) -> bool {
    params::text(&existing.params, key) == params::text(&proposed.params, key)
}

fn value_set(rule: &Rule) -> BTreeSet<String> {
    params::string_list(&rule.params, "values")
        .unwrap_or_default()
        .into_iter()
        .collect()
}

/// Returns true if `proposed` checks the same thing as `existing`.
///
/// Column and condition type must match; parameters are compared per
/// condition type (numeric bounds within 1e-9, class lists as sets, cadence
/// tolerance defaulting to 1.5).
pub fn rule_equals(existing: &Rule, proposed: &Rule) -> bool {
    if existing.column != proposed.column || existing.condition_type != proposed.condition_type {
        return false;
    }
    let (ep, pp) = (&existing.params, &proposed.params);
    match existing.condition_type {
        ConditionType::NotEmpty
        | ConditionType::Unique
        | ConditionType::IsTrue
        | ConditionType::IsFalse => true,
        ConditionType::RegexMatch => same_text(existing, proposed, "pattern"),
        ConditionType::Range => {
            same_bound(params::number(ep, "min"), params::number(pp, "min"))
                && same_bound(params::number(ep, "max"), params::number(pp, "max"))
        }
        ConditionType::Equals => same_text(existing, proposed, "value"),
        ConditionType::GreaterThan | ConditionType::LessThan => {
            same_number(params::number(ep, "value"), params::number(pp, "value"))
        }
        ConditionType::MaxLength => same_number(
            params::number(ep, "maxLength"),
            params::number(pp, "maxLength"),
        ),
        ConditionType::ClassMatch => value_set(existing) == value_set(proposed),
        ConditionType::DateRange | ConditionType::TimeRange | ConditionType::DatetimeRange => {
            same_text(existing, proposed, "min") && same_text(existing, proposed, "max")
        }
        ConditionType::FreshnessWithin => {
            same_number(params::number(ep, "value"), params::number(pp, "value"))
                && same_text(existing, proposed, "unit")
        }
        ConditionType::CadenceWithin => {
            same_number(params::number(ep, "value"), params::number(pp, "value"))
                && same_text(existing, proposed, "unit")
                && (params::tolerance(ep) - params::tolerance(pp)).abs() < RANGE_TOLERANCE
        }
    }
}

/// Returns true if any rule in `rules` equals `proposed`.
pub fn rules_contain(rules: &[Rule], proposed: &Rule) -> bool {
    rules.iter().any(|r| rule_equals(r, proposed))
}

/// Returns true if every proposed rule is already present.
///
/// An empty proposal list is never considered implemented.
pub fn is_suggestion_implemented(rules: &[Rule], proposed: &[Rule]) -> bool {
    !proposed.is_empty() && proposed.iter().all(|p| rules_contain(rules, p))
}

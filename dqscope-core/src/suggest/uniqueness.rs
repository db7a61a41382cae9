//! Near-unique column and composite key heuristic.

use std::collections::HashSet;

use super::patterns::collapse_spaces;
use super::{
    ProfilingContext, RuleProposal, Severity, Suggestion, SuggestionHeuristic, TransformHint,
    TransformKind, pct1,
};
use crate::inference::SemanticType;
use crate::rules::{ConditionType, QualityDimension};

/// Normalizes a cell for uniqueness comparison.
///
/// With `normalize` set, strings are trimmed, inner whitespace runs collapse
/// to one space, and case is folded. Null stays `None`.
pub fn normalize_for_uniqueness(value: Option<&str>, normalize: bool) -> Option<String> {
    let v = value?;
    if normalize {
        Some(collapse_spaces(v.trim()).to_lowercase())
    } else {
        Some(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PairCandidate<'a> {
    a: &'a str,
    b: &'a str,
    dup: usize,
    ratio: f64,
    total: usize,
}

/// Flags near-unique columns and the best near-unique column pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniquenessHeuristic;

impl UniquenessHeuristic {
    fn column_suggestion(
        context: &ProfilingContext<'_>,
        column: &str,
        data_type: SemanticType,
    ) -> Option<Suggestion> {
        let config = context.config();
        let normalized: Vec<String> = context
            .dataset()
            .column_values(column)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| normalize_for_uniqueness(v, config.uniq_normalize_strings))
            .filter(|v| !v.is_empty())
            .collect();
        let non_missing = normalized.len();
        if non_missing == 0 {
            return None;
        }
        let distinct = normalized.iter().collect::<HashSet<_>>().len();
        if distinct < config.uniq_min_distinct {
            return None;
        }
        let dup = non_missing - distinct;
        let uniq_ratio = distinct as f64 / non_missing as f64;
        let dup_ratio = dup as f64 / non_missing as f64;
        if uniq_ratio < config.uniq_min_ratio || dup_ratio > config.uniq_max_dup_ratio {
            return None;
        }

        let severity = if dup > 0 && dup_ratio <= config.uniq_high_dup_ratio {
            Severity::High
        } else {
            Severity::Medium
        };
        let mut rationale = format!(
            "{}% of non-missing values are unique ({}/{})",
            pct1(uniq_ratio * 100.0),
            distinct,
            non_missing
        );
        if dup > 0 {
            rationale.push_str(&format!(
                ". {} duplicate {} suggests a near-unique key with occasional violations",
                dup,
                if dup == 1 { "row" } else { "rows" }
            ));
        }
        rationale.push('.');

        let transforms = if config.uniq_normalize_strings && data_type == SemanticType::String {
            vec![TransformHint::new(
                column,
                TransformKind::Normalize,
                "Trim, collapse spaces, and lower-case prior to uniqueness check",
            )]
        } else {
            Vec::new()
        };

        let proposal = RuleProposal::new(
            column,
            data_type,
            ConditionType::Unique,
            "All non-missing values must be unique",
        );
        let coverage = context.coverage_for_proposal(&proposal);

        Some(
            Suggestion::new(
                format!("uniq-{}", column),
                format!("Near-unique column detected in [{}]: consider 'unique'", column),
                severity,
                QualityDimension::Uniqueness,
                vec![column.to_string()],
            )
            .with_rationale(rationale)
            .with_coverage(coverage)
            .with_rule(proposal)
            .with_transforms(transforms),
        )
    }

    fn best_pair<'a>(context: &ProfilingContext<'a>) -> Option<PairCandidate<'a>> {
        let config = context.config();
        let dataset = context.dataset();
        let candidates: Vec<&'a str> = context
            .columns()
            .filter(|(_, ty)| !ty.is_temporal())
            .map(|(c, _)| c)
            .take(config.composite_max_candidates)
            .collect();
        let normalized: Vec<Vec<Option<String>>> = candidates
            .iter()
            .map(|c| {
                dataset
                    .column_values(c)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|v| normalize_for_uniqueness(v, config.uniq_normalize_strings))
                    .collect()
            })
            .collect();
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());

        let mut best: Option<PairCandidate<'a>> = None;
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let pairs: Vec<(&Option<String>, &Option<String>)> = normalized[i]
                    .iter()
                    .zip(&normalized[j])
                    .filter(|(a, b)| !(blank(*a) && blank(*b)))
                    .collect();
                let total = pairs.len();
                if total < config.composite_min_samples {
                    continue;
                }
                let distinct = pairs.iter().collect::<HashSet<_>>().len();
                let dup = total - distinct;
                let ratio = distinct as f64 / total as f64;
                let dup_ratio = dup as f64 / total as f64;
                if ratio < config.composite_min_ratio || dup_ratio > config.composite_max_dup_ratio
                {
                    continue;
                }
                if best.as_ref().is_none_or(|b| dup < b.dup) {
                    best = Some(PairCandidate {
                        a: candidates[i],
                        b: candidates[j],
                        dup,
                        ratio,
                        total,
                    });
                }
            }
        }
        best
    }
}

impl SuggestionHeuristic for UniquenessHeuristic {
    fn apply(&self, context: &ProfilingContext<'_>) -> Vec<Suggestion> {
        let mut out: Vec<Suggestion> = context
            .columns()
            .filter(|(_, ty)| !ty.is_temporal())
            .filter_map(|(column, ty)| Self::column_suggestion(context, column, ty))
            .collect();

        if let Some(pair) = Self::best_pair(context) {
            tracing::debug!("Composite key candidate [{} + {}]", pair.a, pair.b);
            out.push(
                Suggestion::new(
                    format!("uniq-pair-{}+{}", pair.a, pair.b),
                    format!("Near-unique composite key [{} + {}]", pair.a, pair.b),
                    if pair.dup > 0 {
                        Severity::High
                    } else {
                        Severity::Medium
                    },
                    QualityDimension::Uniqueness,
                    vec![pair.a.to_string(), pair.b.to_string()],
                )
                .with_rationale(format!(
                    "{}% unique pairs ({}/{}).",
                    pct1(pair.ratio * 100.0),
                    pair.total - pair.dup,
                    pair.total
                )),
            );
        }
        out
    }

    fn name(&self) -> &str {
        "uniqueness"
    }

    fn description(&self) -> &str {
        "Flags near-unique columns and near-unique column pairs"
    }
}

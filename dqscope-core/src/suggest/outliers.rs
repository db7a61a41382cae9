//! Robust-bounds outlier heuristic.

use super::{
    ProfilingContext, RuleProposal, Severity, Suggestion, SuggestionHeuristic, TransformHint,
    TransformKind, pct1,
};
use crate::inference::{SemanticType, parse_number};
use crate::rules::{ConditionType, QualityDimension};
use crate::stats::{robust_outlier_bounds, smart_number};

/// Proposes a numeric range from robust bounds when outliers are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlierHeuristic;

impl SuggestionHeuristic for OutlierHeuristic {
    fn apply(&self, context: &ProfilingContext<'_>) -> Vec<Suggestion> {
        let config = context.config();
        let mut out = Vec::new();

        for (column, data_type) in context.columns() {
            if !data_type.is_numeric() {
                continue;
            }
            let values: Vec<f64> = context
                .dataset()
                .non_missing_values(column)
                .into_iter()
                .filter_map(parse_number)
                .collect();
            if values.len() < config.outlier_min_values {
                continue;
            }

            let bounds = robust_outlier_bounds(&values);
            if !bounds.is_usable() {
                tracing::debug!("No usable bounds for [{}] ({})", column, bounds.method.label());
                continue;
            }
            let outliers = values.iter().filter(|v| bounds.is_outlier(**v)).count();
            let out_pct = outliers as f64 / values.len() as f64 * 100.0;
            if out_pct < config.outlier_min_pct {
                continue;
            }

            let severity = if out_pct >= config.outlier_high_pct {
                Severity::High
            } else {
                Severity::Medium
            };
            let proposal = RuleProposal::new(
                column,
                SemanticType::Numeric,
                ConditionType::Range,
                format!("Within robust bounds ({})", bounds.method.label()),
            )
            .with_param("min", bounds.lo)
            .with_param("max", bounds.hi);
            let coverage = context.coverage_for_proposal(&proposal);

            let transforms = vec![
                TransformHint::new(
                    column,
                    TransformKind::Winsorize,
                    format!(
                        "Cap values to [{}, {}]",
                        smart_number(bounds.lo),
                        smart_number(bounds.hi)
                    ),
                ),
                TransformHint::new(
                    column,
                    TransformKind::Nullify,
                    "Convert extreme outliers to null for downstream imputation (if acceptable)",
                ),
                TransformHint::new(
                    column,
                    TransformKind::Log,
                    "Consider log-transform if strictly positive and highly skewed",
                ),
                TransformHint::new(
                    column,
                    TransformKind::Investigate,
                    "Review source system for data entry or unit errors causing spikes",
                ),
            ];

            out.push(
                Suggestion::new(
                    format!("outliers-{}", column),
                    format!("Outliers detected in [{}]: propose robust bounds", column),
                    severity,
                    QualityDimension::Validity,
                    vec![column.to_string()],
                )
                .with_rationale(format!(
                    "{} ({}%) values fall outside {} bounds.",
                    outliers,
                    pct1(out_pct),
                    bounds.method.label()
                ))
                .with_coverage(coverage)
                .with_rule(proposal)
                .with_transforms(transforms)
                .with_tip(format!(
                    "Treat outliers in [{}] now (cap/winsorize or null) to stabilize dashboards, then re-run DQ.",
                    column
                ))
                .with_tip(
                    "If values represent rates or sensors, consider per-group caps (e.g., by site or product).",
                ),
            );
        }
        out
    }

    fn name(&self) -> &str {
        "outliers"
    }

    fn description(&self) -> &str {
        "Proposes robust numeric bounds for columns with outlying values"
    }
}

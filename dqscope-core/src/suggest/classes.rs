//! Class enumeration heuristic.

use serde_json::Value;

use super::{ProfilingContext, RuleProposal, Severity, Suggestion, SuggestionHeuristic, pct1};
use crate::rules::{ConditionType, QualityDimension};
use crate::stats::frequencies;

const PREVIEW_VALUES: usize = 8;

/// Proposes an allow-list for low-cardinality text columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassEnumerationHeuristic;

impl SuggestionHeuristic for ClassEnumerationHeuristic {
    fn apply(&self, context: &ProfilingContext<'_>) -> Vec<Suggestion> {
        let config = context.config();
        let total = context.dataset().row_count();
        let mut out = Vec::new();

        for (column, data_type) in context.columns() {
            if data_type.is_numeric() || data_type.is_temporal() {
                continue;
            }
            let values = context.dataset().non_missing_values(column);
            if values.len() < config.class_min_values {
                continue;
            }
            let mut freq = frequencies(values.iter().copied());
            if freq.is_empty() || freq.len() > config.class_max_distinct {
                continue;
            }
            freq.sort_by(|a, b| b.1.cmp(&a.1));
            freq.truncate(config.class_max_distinct);

            let covered: usize = freq.iter().map(|(_, c)| c).sum();
            let top_coverage = covered as f64 / total.max(1) as f64 * 100.0;
            if top_coverage < config.class_min_coverage_pct {
                continue;
            }

            let classes: Vec<&str> = freq.iter().map(|(v, _)| *v).collect();
            let mut preview = format!(
                "Must be one of: {}",
                classes
                    .iter()
                    .take(PREVIEW_VALUES)
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            if classes.len() > PREVIEW_VALUES {
                preview.push('…');
            }
            let proposal =
                RuleProposal::new(column, data_type, ConditionType::ClassMatch, preview).with_param(
                    "values",
                    Value::from(classes.iter().map(|c| (*c).to_string()).collect::<Vec<_>>()),
                );
            let coverage = context.coverage_for_proposal(&proposal);

            out.push(
                Suggestion::new(
                    format!("class-{}", column),
                    format!("Restricted set detected in [{}]: propose allowed classes", column),
                    Severity::Medium,
                    QualityDimension::Consistency,
                    vec![column.to_string()],
                )
                .with_rationale(format!(
                    "Top {} values cover {}% of rows.",
                    classes.len(),
                    pct1(top_coverage)
                ))
                .with_coverage(coverage)
                .with_rule(proposal),
            );
        }
        out
    }

    fn name(&self) -> &str {
        "class-enumeration"
    }

    fn description(&self) -> &str {
        "Proposes allowed values for columns drawing from a small fixed set"
    }
}

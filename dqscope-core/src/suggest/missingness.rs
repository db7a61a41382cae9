//! Missingness heuristic.

use super::{
    ProfilingContext, RuleProposal, Severity, Suggestion, SuggestionHeuristic, TransformHint,
    TransformKind, pct1,
};
use crate::models::is_missing;
use crate::rules::{ConditionType, QualityDimension};

/// Flags columns with a notable share of null or empty cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingnessHeuristic;

impl SuggestionHeuristic for MissingnessHeuristic {
    fn apply(&self, context: &ProfilingContext<'_>) -> Vec<Suggestion> {
        let dataset = context.dataset();
        let total = dataset.row_count();
        if total == 0 {
            return Vec::new();
        }
        let config = context.config();

        let mut out = Vec::new();
        for (column, data_type) in context.columns() {
            let missing = dataset
                .column_values(column)
                .unwrap_or_default()
                .into_iter()
                .filter(|v| is_missing(*v))
                .count();
            let pct = missing as f64 / total as f64 * 100.0;
            if pct < config.missing_min_pct {
                continue;
            }

            let severity = if pct >= config.missing_high_pct {
                Severity::High
            } else {
                Severity::Medium
            };
            let proposal = RuleProposal::new(
                column,
                data_type,
                ConditionType::NotEmpty,
                "Value must not be empty",
            );
            let coverage = context.coverage_for_proposal(&proposal);

            out.push(
                Suggestion::new(
                    format!("missing-{}", column),
                    format!("High missingness in [{}] ({}%)", column, pct1(pct)),
                    severity,
                    QualityDimension::Completeness,
                    vec![column.to_string()],
                )
                .with_rationale(format!(
                    "About {}% of rows are empty/null in [{}].",
                    pct1(pct),
                    column
                ))
                .with_coverage(coverage)
                .with_rule(proposal)
                .with_transforms(vec![TransformHint::new(
                    column,
                    TransformKind::Map,
                    "Fill null/empty with default or backfill if business-appropriate",
                )]),
            );
        }
        out
    }

    fn name(&self) -> &str {
        "missingness"
    }

    fn description(&self) -> &str {
        "Flags columns whose null/empty share reaches the configured threshold"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EvaluationOptions, evaluate};
    use crate::models::Dataset;
    use crate::rules::Rule;
    use crate::suggest::SuggestionConfig;
    use serde_json::json;

    fn dataset(value: serde_json::Value) -> Dataset {
        Dataset::from_json_str(&value.to_string()).unwrap()
    }

    #[test]
    fn test_high_missingness_is_flagged() {
        let data = dataset(json!([
            {"a": "1", "b": "x"},
            {"a": "",  "b": "y"},
            {"a": null, "b": "z"},
            {"a": "4", "b": "w"}
        ]));
        let config = SuggestionConfig::default();
        let options = EvaluationOptions::default();
        let context = ProfilingContext::new(&data, None, &config, &options);
        let found = MissingnessHeuristic.apply(&context);

        assert_eq!(found.len(), 1);
        let s = &found[0];
        assert_eq!(s.id, "missing-a");
        assert_eq!(s.title, "High missingness in [a] (50.0%)");
        assert_eq!(s.severity, Severity::High);
        assert_eq!(s.dimension, QualityDimension::Completeness);
        assert_eq!(s.rationale, "About 50.0% of rows are empty/null in [a].");
        assert_eq!(s.proposed_rules[0].condition_type, ConditionType::NotEmpty);
        assert_eq!(s.estimated_coverage_pct, Some(0.0));
        assert_eq!(s.transforms[0].kind, TransformKind::Map);
    }

    #[test]
    fn test_medium_severity_between_thresholds() {
        let mut rows: Vec<serde_json::Value> = (0..19).map(|i| json!({"a": i.to_string()})).collect();
        rows.push(json!({"a": ""}));
        let data = dataset(serde_json::Value::Array(rows));
        let config = SuggestionConfig::default();
        let options = EvaluationOptions::default();
        let context = ProfilingContext::new(&data, None, &config, &options);
        let found = MissingnessHeuristic.apply(&context);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn test_coverage_against_failing_rows() {
        let data = dataset(json!([
            {"a": "",  "b": "1"},
            {"a": "x", "b": "200"},
            {"a": "y", "b": "3"}
        ]));
        let rules = vec![
            Rule::new("a", ConditionType::Range)
                .with_param("min", 1)
                .with_param("max", 10),
        ];
        let options = EvaluationOptions::default();
        let report = evaluate(&data, &rules, &options).unwrap();
        let config = SuggestionConfig::default();
        let context = ProfilingContext::new(&data, Some(&report), &config, &options);
        let found = MissingnessHeuristic.apply(&context);
        // Every row of [a] fails the range rule (blank reads as 0); notEmpty would catch one of three.
        let coverage = found[0].estimated_coverage_pct.unwrap();
        assert!((coverage - 100.0 / 3.0).abs() < 1e-9);
    }
}

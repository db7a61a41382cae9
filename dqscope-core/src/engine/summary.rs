//! Narrative summary of an evaluation run.

use std::collections::BTreeSet;

use serde::Serialize;

use super::EvaluationReport;
use crate::models::{Dataset, is_missing};
use crate::rules::Rule;

/// Missingness above this share (percent) is called out.
const HIGH_MISSINGNESS_PCT: f64 = 10.0;

/// A column and how much of it is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingColumn {
    /// Column name
    pub column: String,
    /// Missing cells (null or empty)
    pub missing: usize,
    /// Missing share in percent
    pub pct: f64,
}

/// Headline findings derived from a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    /// Rows evaluated
    pub total_rows: usize,
    /// Rows passing every rule
    pub good_rows: usize,
    /// Share of good rows in percent
    pub good_pct: f64,
    /// Column with the most failing rows, if any row fails
    pub worst_column: Option<(String, usize)>,
    /// Rule label with the most failing rows, if any row fails
    pub worst_rule: Option<(String, usize)>,
    /// Columns over 10% missing, most missing first
    pub high_missingness: Vec<MissingColumn>,
    /// Columns no rule targets
    pub columns_without_rules: Vec<String>,
}

impl AnalysisSummary {
    /// Builds the summary from a finished run.
    pub fn build(dataset: &Dataset, rules: &[Rule], report: &EvaluationReport) -> Self {
        let total_rows = report.total_rows;
        let good_rows = report.good_row_count();
        let good_pct = if total_rows == 0 {
            0.0
        } else {
            good_rows as f64 / total_rows as f64 * 100.0
        };

        let mut high_missingness: Vec<MissingColumn> = dataset
            .headers()
            .iter()
            .filter_map(|h| {
                let missing = dataset
                    .column_values(h)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|v| is_missing(*v))
                    .count();
                let pct = if total_rows == 0 {
                    0.0
                } else {
                    missing as f64 / total_rows as f64 * 100.0
                };
                (pct > HIGH_MISSINGNESS_PCT).then(|| MissingColumn {
                    column: h.clone(),
                    missing,
                    pct,
                })
            })
            .collect();
        high_missingness.sort_by(|a, b| b.pct.total_cmp(&a.pct));

        let ruled: BTreeSet<&str> = rules.iter().map(|r| r.column.as_str()).collect();
        let columns_without_rules = dataset
            .headers()
            .iter()
            .filter(|h| !ruled.contains(h.as_str()))
            .cloned()
            .collect();

        Self {
            total_rows,
            good_rows,
            good_pct,
            worst_column: report.top_columns().into_iter().next().filter(|c| c.1 > 0),
            worst_rule: report.top_rules().into_iter().next().filter(|r| r.1 > 0),
            high_missingness,
            columns_without_rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EvaluationOptions, evaluate};
    use crate::rules::ConditionType;
    use serde_json::json;

    #[test]
    fn test_summary_findings() {
        let data = Dataset::from_json_str(
            &json!([
                {"a": "", "b": "1", "c": null},
                {"a": "", "b": "2", "c": "x"},
                {"a": "x", "b": "3", "c": "y"},
                {"a": "y", "b": "4", "c": "z"}
            ])
            .to_string(),
        )
        .unwrap();
        let rules = vec![
            Rule::new("a", ConditionType::NotEmpty),
            Rule::new("b", ConditionType::Unique),
        ];
        let report = evaluate(&data, &rules, &EvaluationOptions::default()).unwrap();
        let summary = AnalysisSummary::build(&data, &rules, &report);

        assert_eq!(summary.good_rows, 2);
        assert_eq!(summary.good_pct, 50.0);
        assert_eq!(summary.worst_column, Some(("a".to_string(), 2)));
        assert_eq!(summary.worst_rule, Some(("[a] notEmpty".to_string(), 2)));
        let names: Vec<&str> = summary
            .high_missingness
            .iter()
            .map(|m| m.column.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(summary.columns_without_rules, vec!["c".to_string()]);
    }

    #[test]
    fn test_clean_run_has_no_worst_entries() {
        let data = Dataset::from_json_str(r#"[{"a": "1"}, {"a": "2"}]"#).unwrap();
        let rules = vec![Rule::new("a", ConditionType::NotEmpty)];
        let report = evaluate(&data, &rules, &EvaluationOptions::default()).unwrap();
        let summary = AnalysisSummary::build(&data, &rules, &report);
        assert_eq!(summary.worst_column, None);
        assert_eq!(summary.worst_rule, None);
        assert_eq!(summary.good_pct, 100.0);
    }
}

//! Tests for the rule evaluation engine.

use super::*;
use crate::inference::SemanticType;
use crate::rules::ConditionType;
use chrono::TimeZone;
use serde_json::json;

fn dataset(json: serde_json::Value) -> Dataset {
    Dataset::from_json_str(&json.to_string()).unwrap()
}

fn rows(indices: &[usize]) -> BTreeSet<usize> {
    indices.iter().copied().collect()
}

fn run(data: &Dataset, rules: &[Rule]) -> EvaluationReport {
    evaluate(data, rules, &EvaluationOptions::default()).unwrap()
}

#[test]
fn test_unique_flags_every_occurrence() {
    let data = dataset(json!([{"id": "1"}, {"id": "1"}, {"id": "2"}]));
    let report = run(&data, &[Rule::new("id", ConditionType::Unique)]);
    assert_eq!(report.bad_rows_by_rule["[id] unique"], rows(&[0, 1]));
    assert_eq!(
        report.bad_rows_by_dimension[&QualityDimension::Uniqueness],
        rows(&[0, 1])
    );
}

#[test]
fn test_unique_null_and_empty_are_distinct_keys() {
    let data = dataset(json!({
        "headers": ["k"],
        "rows": [[null], [""], [null], ["x"], [""]]
    }));
    assert_eq!(unique_failures(&data, "k"), rows(&[0, 1, 2, 4]));
}

#[test]
fn test_unique_unknown_column_has_no_failures() {
    let data = dataset(json!([{"id": "1"}, {"id": "1"}]));
    assert!(unique_failures(&data, "nope").is_empty());
}

#[test]
fn test_cadence_flags_later_row_of_wide_gap() {
    // Row order is deliberately shuffled; flags follow sorted time.
    let data = dataset(json!([
        {"ts": "2024-01-01 00:00:00"},
        {"ts": "2024-01-01 05:00:00"},
        {"ts": "2024-01-01 01:00:00"},
        {"ts": null},
        {"ts": "2024-01-01 02:00:00"}
    ]));
    let rule = Rule::new("ts", ConditionType::CadenceWithin)
        .with_param("value", 1)
        .with_param("unit", "hour");
    let report = run(&data, &[rule]);
    // Gap 02:00 -> 05:00 exceeds 1.5h; the later row (index 1) fails.
    assert_eq!(report.bad_rows_by_rule["[ts] cadenceWithin"], rows(&[1]));
    assert_eq!(
        report.bad_rows_by_dimension[&QualityDimension::Timeliness],
        rows(&[1])
    );
}

#[test]
fn test_cadence_needs_two_timestamps() {
    let data = dataset(json!([{"ts": "2024-01-01 00:00"}, {"ts": ""}]));
    assert!(cadence_failures(&data, "ts", 1.0).is_empty());
}

#[test]
fn test_cadence_on_time_of_day_uses_milliseconds() {
    let data = dataset(json!([{"t": "08:00"}, {"t": "08:30"}, {"t": "10:00"}]));
    let failures = cadence_failures(&data, "t", 45.0 * 60_000.0);
    assert_eq!(failures, rows(&[2]));
}

#[test]
fn test_empty_inputs_are_a_no_op() {
    let data = dataset(json!([{"a": "1"}]));
    assert!(evaluate(&data, &[], &EvaluationOptions::default()).is_none());

    let empty = Dataset::default();
    let rules = vec![Rule::new("a", ConditionType::NotEmpty)];
    assert!(evaluate(&empty, &rules, &EvaluationOptions::default()).is_none());
}

#[test]
fn test_blank_cells_read_as_zero_for_numeric_rules() {
    let data = dataset(json!({
        "headers": ["v"],
        "rows": [["5"], [""], [null], ["50"]]
    }));
    let rule = Rule::new("v", ConditionType::Range)
        .with_data_type(SemanticType::Numeric)
        .with_param("min", 0)
        .with_param("max", 10);
    let report = run(&data, &[rule]);
    assert_eq!(report.bad_rows_by_rule["[v] range"], rows(&[3]));
    assert_eq!(report.dimension_scores[&QualityDimension::Accuracy], Some(75.0));
    assert_eq!(report.dimension_scores[&QualityDimension::Completeness], None);
}

#[test]
fn test_scores_and_unassessed_dimensions() {
    let data = dataset(json!([
        {"name": "a", "age": "10"},
        {"name": "",  "age": "20"},
        {"name": "c", "age": "200"},
        {"name": "d", "age": "30"}
    ]));
    let rules = vec![
        Rule::new("name", ConditionType::NotEmpty),
        Rule::new("age", ConditionType::Range)
            .with_data_type(SemanticType::Numeric)
            .with_param("min", 0)
            .with_param("max", 120),
    ];
    let report = run(&data, &rules);

    assert_eq!(report.total_rows, 4);
    assert_eq!(report.bad_rows, rows(&[1, 2]));
    assert_eq!(report.good_row_count(), 2);
    assert_eq!(
        report.dimension_scores[&QualityDimension::Completeness],
        Some(75.0)
    );
    assert_eq!(report.dimension_scores[&QualityDimension::Accuracy], Some(75.0));
    assert_eq!(report.dimension_scores[&QualityDimension::Uniqueness], None);
    assert_eq!(report.dimension_scores.len(), QualityDimension::ALL.len());
    assert_eq!(report.avg_score, Some(75.0));
    assert_eq!(report.column_failures("age"), rows(&[2]));
    assert!(report.column_failures("other").is_empty());
}

#[test]
fn test_score_rounding() {
    let data = dataset(json!([{"a": ""}, {"a": "x"}, {"a": "y"}]));
    let report = run(&data, &[Rule::new("a", ConditionType::NotEmpty)]);
    assert_eq!(
        report.dimension_scores[&QualityDimension::Completeness],
        Some(66.67)
    );
}

#[test]
fn test_inert_rules_are_skipped() {
    let data = dataset(json!([{"a": "1"}, {"a": "2"}]));
    let rules = vec![
        Rule::new("a", ConditionType::GreaterThan).with_param("value", "lots"),
        Rule::new("a", ConditionType::NotEmpty),
    ];
    let report = run(&data, &rules);
    assert_eq!(report.skipped_rules.len(), 1);
    assert_eq!(report.skipped_rules[0].label, "[a] greaterThan");
    assert!(!report.bad_rows_by_rule.contains_key("[a] greaterThan"));
    assert_eq!(report.dimension_scores[&QualityDimension::Accuracy], None);
    assert_eq!(
        report.dimension_scores[&QualityDimension::Completeness],
        Some(100.0)
    );
}

#[test]
fn test_invalid_regex_fails_every_row() {
    let data = dataset(json!([{"a": "x"}, {"a": "y"}]));
    let rule = Rule::new("a", ConditionType::RegexMatch).with_param("pattern", "[unclosed");
    let report = run(&data, &[rule]);
    assert_eq!(report.bad_rows, rows(&[0, 1]));
    assert_eq!(report.dimension_scores[&QualityDimension::Validity], Some(0.0));
}

#[test]
fn test_freshness_uses_injected_clock() {
    let data = dataset(json!([
        {"ts": "2024-03-01T12:00:00Z"},
        {"ts": "2024-02-01T12:00:00Z"}
    ]));
    let rule = Rule::new("ts", ConditionType::FreshnessWithin)
        .with_param("value", 2)
        .with_param("unit", "day");
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
    let report = evaluate(&data, &[rule], &EvaluationOptions::at(now)).unwrap();
    assert_eq!(report.bad_rows, rows(&[1]));
}

#[test]
fn test_rule_on_unknown_column_reads_missing() {
    let data = dataset(json!([{"a": "1"}]));
    let report = run(&data, &[Rule::new("ghost", ConditionType::NotEmpty)]);
    assert_eq!(report.bad_rows, rows(&[0]));
}

#[test]
fn test_top_columns_and_rules() {
    let data = dataset(json!([
        {"a": "", "b": ""},
        {"a": "", "b": "x"},
        {"a": "x", "b": "x"}
    ]));
    let rules = vec![
        Rule::new("a", ConditionType::NotEmpty),
        Rule::new("b", ConditionType::NotEmpty),
    ];
    let report = run(&data, &rules);
    assert_eq!(
        report.top_columns(),
        vec![("a".to_string(), 2), ("b".to_string(), 1)]
    );
    assert_eq!(report.top_rules()[0], ("[a] notEmpty".to_string(), 2));
}

#[test]
fn test_results_export_payload() {
    let data = dataset(json!([{"a": ""}, {"a": "x"}, {"a": "y"}]));
    let rules = vec![Rule::new("a", ConditionType::NotEmpty)];
    let report = run(&data, &rules);
    let payload = serde_json::to_value(report.export(&data, &rules)).unwrap();
    assert_eq!(payload["columns"], json!(["a"]));
    assert_eq!(payload["rowCount"], 3);
    assert_eq!(payload["badRowCount"], 1);
    assert_eq!(payload["avgScore"], 66.67);
    assert_eq!(payload["dimensionScores"]["Completeness"], 66.67);
    assert!(payload["dimensionScores"]["Timeliness"].is_null());
    assert_eq!(payload["rules"][0]["conditionType"], "notEmpty");
}

#[test]
fn test_report_serializes_dimension_keys() {
    let data = dataset(json!([{"a": ""}]));
    let report = run(&data, &[Rule::new("a", ConditionType::NotEmpty)]);
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["bad_rows_by_dimension"]["Completeness"], json!([0]));
}

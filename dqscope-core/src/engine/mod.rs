//! Rule evaluation engine.
//!
//! [`evaluate`] runs every rule over every row once and aggregates the failing
//! row indices by quality dimension, by column and by rule label. Dataset-
//! scoped checks (uniqueness, cadence) are resolved over the whole column;
//! per-row predicates are evaluated cell by cell.
//!
//! # Example
//! ```rust
//! use dqscope_core::engine::{EvaluationOptions, evaluate};
//! use dqscope_core::rules::{ConditionType, Rule};
//! use dqscope_core::Dataset;
//!
//! let dataset = Dataset::from_json_str(r#"[{"id": "1"}, {"id": "1"}, {"id": "2"}]"#).unwrap();
//! let rules = vec![Rule::new("id", ConditionType::Unique)];
//! let report = evaluate(&dataset, &rules, &EvaluationOptions::default()).unwrap();
//! assert_eq!(report.bad_row_count(), 2);
//! ```

pub mod summary;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::inference::infer_column_type;
use crate::models::Dataset;
use crate::rules::{CompiledRule, DatasetCheck, QualityDimension, Rule, RuleKind};
use crate::stats::round2;
use crate::temporal::parse_temporal_ms;

pub use summary::AnalysisSummary;

/// Options for one evaluation run.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationOptions {
    /// Reference instant for freshness checks
    pub now: DateTime<Utc>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self { now: Utc::now() }
    }
}

impl EvaluationOptions {
    /// Evaluates as of a fixed instant.
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// The reference instant in epoch milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.now.timestamp_millis() as f64
    }
}

/// A rule left out of a run because it could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRule {
    /// Rule label, `[column] conditionType`
    pub label: String,
    /// Compilation error
    pub reason: String,
}

/// Failing rows and scores of one evaluation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    /// Number of rows evaluated
    pub total_rows: usize,
    /// Failing rows per assessed dimension
    pub bad_rows_by_dimension: BTreeMap<QualityDimension, BTreeSet<usize>>,
    /// Failing rows per column with at least one rule
    pub bad_rows_by_column: BTreeMap<String, BTreeSet<usize>>,
    /// Failing rows per rule label
    pub bad_rows_by_rule: BTreeMap<String, BTreeSet<usize>>,
    /// Union of the per-dimension sets
    pub bad_rows: BTreeSet<usize>,
    /// Score per dimension; `None` when no rule maps to it
    pub dimension_scores: BTreeMap<QualityDimension, Option<f64>>,
    /// Mean of the assessed dimension scores
    pub avg_score: Option<f64>,
    /// Rules that did not take part in the run
    pub skipped_rules: Vec<SkippedRule>,
}

impl EvaluationReport {
    /// Number of rows failing at least one rule.
    pub fn bad_row_count(&self) -> usize {
        self.bad_rows.len()
    }

    /// Number of rows passing every rule.
    pub fn good_row_count(&self) -> usize {
        self.total_rows.saturating_sub(self.bad_rows.len())
    }

    /// Failing rows recorded for a column; empty when it has none.
    pub fn column_failures(&self, column: &str) -> BTreeSet<usize> {
        self.bad_rows_by_column
            .get(column)
            .cloned()
            .unwrap_or_default()
    }

    /// Columns by failing-row count, largest first.
    pub fn top_columns(&self) -> Vec<(String, usize)> {
        ranked(&self.bad_rows_by_column)
    }

    /// Rule labels by failing-row count, largest first.
    pub fn top_rules(&self) -> Vec<(String, usize)> {
        ranked(&self.bad_rows_by_rule)
    }

    /// Builds the telemetry payload for this run.
    pub fn export(&self, dataset: &Dataset, rules: &[Rule]) -> ResultsExport {
        ResultsExport {
            columns: dataset.headers().to_vec(),
            row_count: self.total_rows,
            bad_row_count: self.bad_row_count(),
            avg_score: self.avg_score.map(round2),
            dimension_scores: self
                .dimension_scores
                .iter()
                .map(|(d, s)| (d.as_str().to_string(), *s))
                .collect(),
            rules: rules.to_vec(),
        }
    }
}

fn ranked(sets: &BTreeMap<String, BTreeSet<usize>>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = sets
        .iter()
        .map(|(name, rows)| (name.clone(), rows.len()))
        .collect();
    // Stable sort keeps name order among ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Advisory results payload sent to an external sink after a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsExport {
    /// Dataset headers
    pub columns: Vec<String>,
    /// Rows evaluated
    pub row_count: usize,
    /// Rows failing at least one rule
    pub bad_row_count: usize,
    /// Mean dimension score, two decimals
    pub avg_score: Option<f64>,
    /// Score per dimension name
    pub dimension_scores: BTreeMap<String, Option<f64>>,
    /// Rules in effect
    pub rules: Vec<Rule>,
}

/// Rows of `column` whose raw value occurs more than once.
///
/// Null and empty string are distinct values; repeats of either count. Every
/// occurrence of a repeated value is flagged, including the first.
pub fn unique_failures(dataset: &Dataset, column: &str) -> BTreeSet<usize> {
    let mut failures = BTreeSet::new();
    let Some(idx) = dataset.column_index(column) else {
        return failures;
    };
    let mut first_seen: HashMap<Option<&str>, usize> = HashMap::new();
    for row in 0..dataset.row_count() {
        let value = dataset.cell(row, idx);
        match first_seen.get(&value) {
            Some(&first) => {
                failures.insert(first);
                failures.insert(row);
            }
            None => {
                first_seen.insert(value, row);
            }
        }
    }
    failures
}

/// Rows following a gap wider than `max_allowed_ms` on the sorted timeline.
///
/// Values are parsed by the column's inferred temporal type (times of day
/// in milliseconds); unparseable values are ignored. Fewer than two
/// timestamps, or a non-temporal column, yields no failures.
pub fn cadence_failures(dataset: &Dataset, column: &str, max_allowed_ms: f64) -> BTreeSet<usize> {
    let ty = infer_column_type(dataset, column);
    let mut timeline: Vec<(f64, usize)> = dataset
        .column_values(column)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(row, value)| value.and_then(|v| parse_temporal_ms(v, ty)).map(|t| (t, row)))
        .collect();
    if timeline.len() < 2 {
        return BTreeSet::new();
    }
    timeline.sort_by(|a, b| a.0.total_cmp(&b.0));
    timeline
        .windows(2)
        .filter(|pair| pair[1].0 - pair[0].0 > max_allowed_ms)
        .map(|pair| pair[1].1)
        .collect()
}

/// Rows failing one compiled rule.
///
/// A column absent from the dataset reads as all-missing.
pub fn rule_failures(dataset: &Dataset, rule: &CompiledRule, now_ms: f64) -> BTreeSet<usize> {
    match &rule.kind {
        RuleKind::Dataset(DatasetCheck::Unique) => unique_failures(dataset, &rule.column),
        RuleKind::Dataset(DatasetCheck::Cadence { max_allowed_ms }) => {
            cadence_failures(dataset, &rule.column, *max_allowed_ms)
        }
        RuleKind::Row(predicate) => {
            let idx = dataset.column_index(&rule.column);
            (0..dataset.row_count())
                .filter(|&row| {
                    let value = idx.and_then(|i| dataset.cell(row, i));
                    !predicate.evaluate(value, now_ms)
                })
                .collect()
        }
    }
}

fn dimension_score(bad: usize, total: usize) -> f64 {
    let score = 100.0 - (bad as f64 / total as f64) * 100.0;
    round2(score).max(0.0)
}

/// Runs every rule over the dataset.
///
/// Returns `None` when the dataset or the rule list is empty. Rules that do
/// not compile are skipped with a warning and listed in
/// [`EvaluationReport::skipped_rules`].
pub fn evaluate(
    dataset: &Dataset,
    rules: &[Rule],
    options: &EvaluationOptions,
) -> Option<EvaluationReport> {
    if dataset.is_empty() || rules.is_empty() {
        tracing::debug!(
            "Nothing to evaluate ({} rows, {} rules)",
            dataset.row_count(),
            rules.len()
        );
        return None;
    }

    let now_ms = options.now_ms();
    let mut report = EvaluationReport {
        total_rows: dataset.row_count(),
        ..EvaluationReport::default()
    };

    let mut compiled = Vec::with_capacity(rules.len());
    for rule in rules {
        match rule.compile() {
            Ok(c) => compiled.push(c),
            Err(e) => {
                tracing::warn!("Skipping rule {}: {}", rule.label(), e);
                report.skipped_rules.push(SkippedRule {
                    label: rule.label(),
                    reason: e.to_string(),
                });
            }
        }
    }

    for rule in &compiled {
        if !dataset.has_column(&rule.column) {
            tracing::warn!("Rule {} targets unknown column '{}'", rule.label, rule.column);
        }
        let failures = rule_failures(dataset, rule, now_ms);
        tracing::debug!("Rule {} failed {} rows", rule.label, failures.len());

        report
            .bad_rows_by_dimension
            .entry(rule.dimension)
            .or_default()
            .extend(failures.iter().copied());
        report
            .bad_rows_by_column
            .entry(rule.column.clone())
            .or_default()
            .extend(failures.iter().copied());
        report
            .bad_rows_by_rule
            .entry(rule.label.clone())
            .or_default()
            .extend(failures);
    }

    report.bad_rows = report
        .bad_rows_by_dimension
        .values()
        .flatten()
        .copied()
        .collect();

    for dimension in QualityDimension::ALL {
        let score = report
            .bad_rows_by_dimension
            .get(&dimension)
            .map(|bad| dimension_score(bad.len(), report.total_rows));
        report.dimension_scores.insert(dimension, score);
    }
    let assessed: Vec<f64> = report.dimension_scores.values().flatten().copied().collect();
    report.avg_score =
        (!assessed.is_empty()).then(|| assessed.iter().sum::<f64>() / assessed.len() as f64);

    tracing::info!(
        "Evaluated {} rules over {} rows: {} bad rows",
        compiled.len(),
        report.total_rows,
        report.bad_row_count()
    );
    Some(report)
}

#[cfg(test)]
mod tests;

//! Per-column profiles for charting.
//!
//! The profile shape follows the inferred type: numeric columns get summary
//! statistics and a histogram, temporal columns get their span, cadence and
//! calendar buckets, and everything else gets a frequency table.

use std::collections::HashSet;

use serde::Serialize;

use crate::inference::{SemanticType, infer_column_type, parse_number};
use crate::models::Dataset;
use crate::stats::{Frequency, Histogram, NumericSummary, build_histogram, numeric_summary, top_n};
use crate::temporal::{
    Buckets, IntervalSummary, bucket_date_times, bucket_times_of_day, consecutive_diffs,
    fmt_date_ms, fmt_datetime_ms, fmt_time_sec, to_date_like_series,
};

/// Upper bound on histogram bins.
pub const UI_MAX_BINS: usize = 60;

/// Values listed in a categorical frequency table.
pub const TOP_CATEGORIES: usize = 5;

/// Numeric column profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericProfile {
    /// Column name
    pub column: String,
    /// Summary statistics
    pub summary: NumericSummary,
    /// Value distribution
    pub histogram: Histogram,
}

/// Date, datetime or time-of-day column profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalProfile {
    /// Column name
    pub column: String,
    /// Inferred temporal type
    pub data_type: SemanticType,
    /// Earliest value, formatted for the type
    pub start: Option<String>,
    /// Latest value, formatted for the type
    pub end: Option<String>,
    /// Values that parsed
    pub parsed: usize,
    /// Distinct non-missing raw values
    pub distinct: usize,
    /// Missing cells
    pub missing: usize,
    /// Most frequent raw value
    pub mode: Option<String>,
    /// Share of non-missing values equal to the mode, in percent
    pub mode_pct: f64,
    /// Every non-missing value occurs once
    pub all_unique: bool,
    /// Gap statistics between consecutive values
    pub intervals: Option<IntervalSummary>,
    /// Calendar or hourly buckets
    pub buckets: Buckets,
}

/// Text or boolean column profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalProfile {
    /// Column name
    pub column: String,
    /// Inferred type
    pub data_type: SemanticType,
    /// Most frequent values
    pub top: Vec<Frequency>,
    /// Distinct non-missing values
    pub distinct: usize,
    /// Missing cells
    pub missing: usize,
    /// Total rows
    pub total: usize,
}

/// Profile of one column, shaped by its inferred type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnProfile {
    /// Numeric column
    Numeric(NumericProfile),
    /// Temporal column
    Temporal(TemporalProfile),
    /// Anything else
    Categorical(CategoricalProfile),
}

impl ColumnProfile {
    /// Column the profile describes.
    pub fn column(&self) -> &str {
        match self {
            Self::Numeric(p) => &p.column,
            Self::Temporal(p) => &p.column,
            Self::Categorical(p) => &p.column,
        }
    }
}

fn temporal_profile(column: &str, ty: SemanticType, values: &[&str], total: usize) -> TemporalProfile {
    let mut series = to_date_like_series(values, ty);
    series.sort_by(f64::total_cmp);
    let is_time = ty == SemanticType::Time;
    let format = |v: f64| match ty {
        SemanticType::Date => fmt_date_ms(v),
        SemanticType::Time => Some(fmt_time_sec(v)),
        _ => fmt_datetime_ms(v),
    };

    let top = top_n(values, 1);
    let distinct = values.iter().collect::<HashSet<_>>().len();
    TemporalProfile {
        column: column.to_string(),
        data_type: ty,
        start: series.first().and_then(|v| format(*v)),
        end: series.last().and_then(|v| format(*v)),
        parsed: series.len(),
        distinct,
        missing: total.saturating_sub(values.len()),
        mode: top.first().map(|f| f.value.clone()),
        mode_pct: top.first().map_or(0.0, |f| f.pct),
        all_unique: !values.is_empty() && distinct == values.len(),
        intervals: crate::temporal::interval_summary(&consecutive_diffs(&series), is_time),
        buckets: if is_time {
            bucket_times_of_day(&series)
        } else {
            bucket_date_times(&series)
        },
    }
}

/// Profiles one column; `None` for a column the dataset does not have.
///
/// `bins` overrides the histogram bin count, clamped to `[3, UI_MAX_BINS]`.
pub fn profile_column(dataset: &Dataset, column: &str, bins: Option<usize>) -> Option<ColumnProfile> {
    if !dataset.has_column(column) {
        return None;
    }
    let ty = infer_column_type(dataset, column);
    let values = dataset.non_missing_values(column);
    let total = dataset.row_count();

    let profile = if ty.is_numeric() {
        let parsed: Vec<f64> = values.iter().filter_map(|v| parse_number(v)).collect();
        ColumnProfile::Numeric(NumericProfile {
            column: column.to_string(),
            summary: numeric_summary(&values, total),
            histogram: build_histogram(&parsed, bins, UI_MAX_BINS),
        })
    } else if ty.is_temporal() {
        ColumnProfile::Temporal(temporal_profile(column, ty, &values, total))
    } else {
        ColumnProfile::Categorical(CategoricalProfile {
            column: column.to_string(),
            data_type: ty,
            top: top_n(&values, TOP_CATEGORIES),
            distinct: values.iter().collect::<HashSet<_>>().len(),
            missing: total.saturating_sub(values.len()),
            total,
        })
    };
    tracing::debug!("Profiled [{}] as {}", column, ty);
    Some(profile)
}

/// Profiles every column in header order.
pub fn profile_dataset(dataset: &Dataset, bins: Option<usize>) -> Vec<ColumnProfile> {
    dataset
        .headers()
        .iter()
        .filter_map(|h| profile_column(dataset, h, bins))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(value: serde_json::Value) -> Dataset {
        Dataset::from_json_str(&value.to_string()).unwrap()
    }

    #[test]
    fn test_numeric_profile() {
        let data = dataset(json!([
            {"n": "1"}, {"n": "2"}, {"n": "3"}, {"n": "4"}, {"n": ""}
        ]));
        let Some(ColumnProfile::Numeric(p)) = profile_column(&data, "n", None) else {
            unreachable!("numeric column expected");
        };
        assert_eq!(p.summary.n, 4);
        assert_eq!(p.summary.missing, 1);
        assert_eq!(p.summary.mean, Some(2.5));
        assert_eq!(p.histogram.counts.iter().sum::<usize>(), 4);
        assert_eq!(p.histogram.counts.len(), 3);
    }

    #[test]
    fn test_bin_override_is_clamped() {
        let rows: Vec<serde_json::Value> = (0..200).map(|i| json!({"n": i.to_string()})).collect();
        let data = dataset(serde_json::Value::Array(rows));
        let Some(ColumnProfile::Numeric(p)) = profile_column(&data, "n", Some(500)) else {
            unreachable!("numeric column expected");
        };
        assert_eq!(p.histogram.counts.len(), UI_MAX_BINS);
    }

    #[test]
    fn test_time_profile() {
        let data = dataset(json!([
            {"t": "08:00"}, {"t": "09:30"}, {"t": "09:30"}, {"t": "12:00"}
        ]));
        let Some(ColumnProfile::Temporal(p)) = profile_column(&data, "t", None) else {
            unreachable!("temporal column expected");
        };
        assert_eq!(p.data_type, SemanticType::Time);
        assert_eq!(p.start.as_deref(), Some("08:00:00"));
        assert_eq!(p.end.as_deref(), Some("12:00:00"));
        assert_eq!(p.mode.as_deref(), Some("09:30"));
        assert_eq!(p.mode_pct, 50.0);
        assert!(!p.all_unique);
        assert_eq!(p.buckets.counts[9], 2);
        assert_eq!(p.intervals.unwrap().n, 3);
    }

    #[test]
    fn test_datetime_profile() {
        let data = dataset(json!([
            {"ts": "2024-01-01 10:00:00"},
            {"ts": "2024-01-03 10:00:00"},
            {"ts": "2024-01-02 10:00:00"}
        ]));
        let Some(ColumnProfile::Temporal(p)) = profile_column(&data, "ts", None) else {
            unreachable!("temporal column expected");
        };
        assert_eq!(p.start.as_deref(), Some("2024-01-01 10:00:00"));
        assert_eq!(p.end.as_deref(), Some("2024-01-03 10:00:00"));
        assert!(p.all_unique);
        assert_eq!(p.buckets.labels.len(), 3);
    }

    #[test]
    fn test_categorical_profile() {
        let data = dataset(json!([
            {"c": "red"}, {"c": "blue"}, {"c": "red"}, {"c": null}
        ]));
        let profiles = profile_dataset(&data, None);
        let ColumnProfile::Categorical(p) = &profiles[0] else {
            unreachable!("categorical column expected");
        };
        assert_eq!(p.top[0].value, "red");
        assert_eq!(p.top[0].count, 2);
        assert_eq!(p.distinct, 2);
        assert_eq!(p.missing, 1);
        assert_eq!(profiles[0].column(), "c");
    }

    #[test]
    fn test_unknown_column() {
        let data = dataset(json!([{"a": "1"}]));
        assert!(profile_column(&data, "b", None).is_none());
    }
}

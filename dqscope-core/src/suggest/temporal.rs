//! Date window, freshness and cadence heuristic.

use super::{
    ProfilingContext, RuleProposal, Severity, Suggestion, SuggestionHeuristic, TransformHint,
    TransformKind,
};
use crate::inference::SemanticType;
use crate::rules::{ConditionType, QualityDimension};
use crate::stats::quantile;
use crate::temporal::{
    DAY_MS, HOUR_MS, MINUTE_MS, TimeUnit, WEEK_MS, fmt_date_ms, fmt_time_sec,
    format_duration, format_local_iso_minute, infer_resolution, median_positive_gap,
    parse_temporal_ms,
};

/// Freshness window derived from the median gap between timestamps.
fn window_from_gap(median_gap_ms: f64) -> (u64, TimeUnit) {
    if !median_gap_ms.is_finite() || median_gap_ms <= 0.0 {
        return (1, TimeUnit::Day);
    }
    let (unit, unit_ms) = if median_gap_ms <= 2.0 * MINUTE_MS {
        (TimeUnit::Minute, MINUTE_MS)
    } else if median_gap_ms <= 2.0 * HOUR_MS {
        (TimeUnit::Hour, HOUR_MS)
    } else if median_gap_ms <= 2.0 * DAY_MS {
        (TimeUnit::Day, DAY_MS)
    } else {
        (TimeUnit::Week, WEEK_MS)
    };
    ((median_gap_ms / unit_ms).round().max(1.0) as u64, unit)
}

/// Proposes a range, freshness and cadence rule for temporal columns.
///
/// Time-of-day columns get a whole-day range and are never marked stale.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalWindowHeuristic;

impl TemporalWindowHeuristic {
    fn column_suggestion(
        context: &ProfilingContext<'_>,
        column: &str,
        data_type: SemanticType,
    ) -> Option<Suggestion> {
        let raw = context.dataset().non_missing_values(column);
        if raw.len() < context.config().temporal_min_values {
            return None;
        }
        let mut series: Vec<f64> = raw
            .iter()
            .filter_map(|v| parse_temporal_ms(v, data_type))
            .collect();
        if series.is_empty() {
            return None;
        }
        series.sort_by(f64::total_cmp);

        let is_time = data_type == SemanticType::Time;
        let unit = infer_resolution(&series).unit;
        let median_gap = median_positive_gap(&series);
        let latest = series[series.len() - 1];
        let now = context.now_ms();
        let allowance = if median_gap.is_finite() {
            1.5 * median_gap
        } else {
            HOUR_MS
        };
        let stale = !is_time && now - latest > allowance;
        let (fresh_value, fresh_unit) = window_from_gap(median_gap);

        let (range, rationale) = if is_time {
            (
                RuleProposal::new(column, data_type, ConditionType::TimeRange, "Valid time of day")
                    .with_param("min", "00:00")
                    .with_param("max", "23:59"),
                "Detected valid times of day.".to_string(),
            )
        } else {
            let lo = quantile(&series, 0.01);
            let hi = quantile(&series, 0.99);
            let (condition_type, min, max) = if data_type == SemanticType::Date {
                (ConditionType::DateRange, fmt_date_ms(lo)?, fmt_date_ms(hi)?)
            } else {
                (
                    ConditionType::DatetimeRange,
                    format_local_iso_minute(lo)?,
                    format_local_iso_minute(hi)?,
                )
            };
            let mut rationale = format!(
                "Observed timeline spans {} → {}. Typical interval ≈ 1 {}.",
                min, max, unit
            );
            if stale {
                rationale.push_str(" Latest timestamp suggests the feed may be stale.");
            }
            (
                RuleProposal::new(
                    column,
                    data_type,
                    condition_type,
                    format!("Between {} and {}", min, max),
                )
                .with_param("min", min)
                .with_param("max", max),
                rationale,
            )
        };

        let format_hint = match data_type {
            SemanticType::Date => "YYYY-MM-DD",
            SemanticType::Time => "HH:MM",
            _ => "YYYY-MM-DDTHH:MM",
        };
        let transforms = vec![
            TransformHint::new(
                column,
                TransformKind::Format,
                format!("Preserve {} format consistently", format_hint),
            ),
            TransformHint::new(
                column,
                TransformKind::Dedupe,
                "Remove accidental duplicate timestamps (same minute)",
            ),
        ];

        let cadence_tip = if stale {
            format!(
                "Feed appears stale. Expect ~every {}; consider alerting if no data within {} {}(s).",
                unit, fresh_value, fresh_unit
            )
        } else {
            format!("Dataset appears to update roughly every {}.", unit)
        };
        let recency_tip = if is_time {
            format!("Latest time-of-day observed: {}.", fmt_time_sec(latest / 1000.0))
        } else {
            format!("Last record was {} ago.", format_duration(now - latest))
        };

        Some(
            Suggestion::new(
                format!("timewin-{}", column),
                format!("Propose {} window for [{}] and update cadence", data_type, column),
                if stale { Severity::High } else { Severity::Medium },
                QualityDimension::Timeliness,
                vec![column.to_string()],
            )
            .with_rationale(rationale)
            .with_rule(range)
            .with_rule(
                RuleProposal::new(
                    column,
                    data_type,
                    ConditionType::FreshnessWithin,
                    format!("Timestamp is within last {} {}(s)", fresh_value, fresh_unit),
                )
                .with_param("value", fresh_value)
                .with_param("unit", fresh_unit.as_str()),
            )
            .with_rule(
                RuleProposal::new(
                    column,
                    data_type,
                    ConditionType::CadenceWithin,
                    format!("Max interval ≤ {} {}(s) (±50%)", fresh_value, fresh_unit),
                )
                .with_param("value", fresh_value)
                .with_param("unit", fresh_unit.as_str())
                .with_param("tolerance", 1.5),
            )
            .with_transforms(transforms)
            .with_tip(cadence_tip)
            .with_tip(recency_tip),
        )
    }
}

impl SuggestionHeuristic for TemporalWindowHeuristic {
    fn apply(&self, context: &ProfilingContext<'_>) -> Vec<Suggestion> {
        context
            .columns()
            .filter(|(_, ty)| ty.is_temporal())
            .filter_map(|(column, ty)| Self::column_suggestion(context, column, ty))
            .collect()
    }

    fn name(&self) -> &str {
        "temporal-window"
    }

    fn description(&self) -> &str {
        "Proposes date windows, freshness and cadence checks for temporal columns"
    }
}

//! Temporal parsing, formatting and interval helpers.
//!
//! Dates and datetimes become milliseconds since the epoch, interpreted in
//! the local time zone unless the text carries an explicit offset. Times of
//! day become seconds since midnight. Every parser returns `None` for text it
//! cannot read; callers drop those values from series.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone,
};
use serde::{Deserialize, Serialize};

use crate::error::DqError;
use crate::inference::{SemanticType, ShapePatterns};

/// Milliseconds in one minute.
pub const MINUTE_MS: f64 = 60_000.0;
/// Milliseconds in one hour.
pub const HOUR_MS: f64 = 3_600_000.0;
/// Milliseconds in one day.
pub const DAY_MS: f64 = 86_400_000.0;
/// Milliseconds in one week.
pub const WEEK_MS: f64 = 7.0 * DAY_MS;

/// Human time unit used for freshness, cadence and interval display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// One second
    Second,
    /// One minute
    Minute,
    /// One hour
    Hour,
    /// One day
    Day,
    /// Seven days
    Week,
    /// Thirty days
    Month,
}

impl TimeUnit {
    /// Length of the unit in milliseconds.
    pub const fn millis(self) -> f64 {
        match self {
            Self::Second => 1_000.0,
            Self::Minute => MINUTE_MS,
            Self::Hour => HOUR_MS,
            Self::Day => DAY_MS,
            Self::Week => WEEK_MS,
            Self::Month => 30.0 * DAY_MS,
        }
    }

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Resolves a freshness/cadence unit parameter.
    ///
    /// `minute`, `hour` and `day` are recognized; any other non-empty unit
    /// means a week.
    pub fn window_unit(raw: &str) -> Self {
        match raw {
            "minute" => Self::Minute,
            "hour" => Self::Hour,
            "day" => Self::Day,
            _ => Self::Week,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = DqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "second" => Ok(Self::Second),
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(DqError::configuration(format!("unknown time unit '{}'", other))),
        }
    }
}

fn local_millis(naive: NaiveDateTime) -> Option<f64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        // Wall-clock times inside a DST gap move forward past the gap
        .or_else(|| Local.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .map(|dt| dt.timestamp_millis() as f64)
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let sign = if raw.starts_with('-') { -1 } else { 1 };
    let digits: String = raw[1..].chars().filter(char::is_ascii_digit).collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4)?.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses `YYYY-MM-DD` to local midnight in epoch milliseconds.
pub fn parse_date_to_ms(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let patterns = ShapePatterns::instance()?;
    if !patterns.date.is_match(s) {
        return None;
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    local_millis(date.and_hms_opt(0, 0, 0)?)
}

/// Parses an ISO-like timestamp to epoch milliseconds.
///
/// Accepts `YYYY-MM-DD`, optionally followed by `[ T]HH:MM[:SS][.fff]` and an
/// offset (`Z`, `+HH:MM`, `+HHMM`). Without an offset the wall-clock time is
/// local; a bare date means local midnight.
pub fn parse_datetime_to_ms(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let caps = ShapePatterns::instance()?.timestamp.captures(s)?;
    let num = |i: usize| -> Option<u32> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, num(2)?, num(3)?)?;
    let millis = caps.get(7).map_or(Some(0), |m| {
        let mut frac: String = m.as_str().chars().take(3).collect();
        while frac.len() < 3 {
            frac.push('0');
        }
        frac.parse().ok()
    })?;
    let time = NaiveTime::from_hms_milli_opt(num(4)?, num(5)?, num(6)?, millis)?;
    let naive = date.and_time(time);
    match caps.get(8) {
        Some(offset) => {
            let offset = parse_offset(offset.as_str())?;
            offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.timestamp_millis() as f64)
        }
        None => local_millis(naive),
    }
}

/// Parses `HH:MM[:SS]` to seconds since midnight.
///
/// Components are not range-checked, so `25:00` reads as 90000 seconds.
pub fn parse_time_to_sec(raw: &str) -> Option<f64> {
    let caps = ShapePatterns::instance()?.time.captures(raw.trim())?;
    let part = |i: usize| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map_or(0.0, f64::from)
    };
    Some(part(1) * 3600.0 + part(2) * 60.0 + part(3))
}

/// Parses a value according to a temporal type.
///
/// Dates and datetimes yield milliseconds, times yield seconds. Non-temporal
/// types yield `None`.
pub fn parse_temporal(raw: &str, ty: SemanticType) -> Option<f64> {
    match ty {
        SemanticType::Date => parse_date_to_ms(raw),
        SemanticType::Datetime => parse_datetime_to_ms(raw),
        SemanticType::Time => parse_time_to_sec(raw),
        _ => None,
    }
}

/// Converts values to a numeric timeline, silently dropping unparseable ones.
///
/// Units follow [`parse_temporal`]. The result keeps input order.
pub fn to_date_like_series<S: AsRef<str>>(values: &[S], ty: SemanticType) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| parse_temporal(v.as_ref(), ty))
        .collect()
}

/// Like [`parse_temporal`] but always in milliseconds (times are scaled).
pub fn parse_temporal_ms(raw: &str, ty: SemanticType) -> Option<f64> {
    let value = parse_temporal(raw, ty)?;
    Some(if ty == SemanticType::Time {
        value * 1000.0
    } else {
        value
    })
}

fn local_datetime(ms: f64) -> Option<DateTime<Local>> {
    if !ms.is_finite() {
        return None;
    }
    Local.timestamp_millis_opt(ms.floor() as i64).earliest()
}

/// Formats epoch milliseconds as a local `YYYY-MM-DD`.
pub fn fmt_date_ms(ms: f64) -> Option<String> {
    local_datetime(ms).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Formats epoch milliseconds as a local `YYYY-MM-DD HH:MM:SS`.
pub fn fmt_datetime_ms(ms: f64) -> Option<String> {
    local_datetime(ms).map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Formats epoch milliseconds as a local `YYYY-MM-DDTHH:MM`.
pub fn format_local_iso_minute(ms: f64) -> Option<String> {
    local_datetime(ms).map(|d| d.format("%Y-%m-%dT%H:%M").to_string())
}

/// Formats seconds since midnight as `HH:MM:SS`.
pub fn fmt_time_sec(sec: f64) -> String {
    let sec = if sec.is_finite() { sec.max(0.0) } else { 0.0 };
    let h = (sec / 3600.0).floor();
    let m = ((sec / 60.0) % 60.0).floor();
    let s = (sec % 60.0).floor();
    format!("{:02}:{:02}:{:02}", h as u64, m as u64, s as u64)
}

/// Formats a duration as `1d 2h 3m`, falling back to seconds (`42s`).
///
/// Negative or non-finite input yields `n/a`.
pub fn format_duration(ms: f64) -> String {
    if !ms.is_finite() || ms < 0.0 {
        return "n/a".to_string();
    }
    let total = (ms / 1000.0).floor() as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if parts.is_empty() {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}

/// Differences between consecutive points of a sorted timeline.
///
/// Only finite, non-negative gaps are kept.
pub fn consecutive_diffs(sorted: &[f64]) -> Vec<f64> {
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| d.is_finite() && *d >= 0.0)
        .collect()
}

/// Typical spacing of a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Nearest human unit
    pub unit: TimeUnit,
    /// Unit length in milliseconds
    pub step_ms: f64,
}

impl Resolution {
    const fn of(unit: TimeUnit) -> Self {
        Self {
            unit,
            step_ms: unit.millis(),
        }
    }
}

/// Infers the cadence unit of a sorted millisecond timeline.
///
/// Uses the median positive gap; fewer than four points default to days.
pub fn infer_resolution(sorted_ms: &[f64]) -> Resolution {
    if sorted_ms.len() < 4 {
        return Resolution::of(TimeUnit::Day);
    }
    let med = median_positive_gap(sorted_ms);
    if !med.is_finite() || med <= 0.0 {
        return Resolution::of(TimeUnit::Day);
    }
    let unit = if med <= 2.0 * MINUTE_MS {
        TimeUnit::Minute
    } else if med <= 2.0 * HOUR_MS {
        TimeUnit::Hour
    } else if med <= 2.0 * DAY_MS {
        TimeUnit::Day
    } else if med <= 2.0 * WEEK_MS {
        TimeUnit::Week
    } else {
        TimeUnit::Month
    };
    Resolution::of(unit)
}

/// Median of the strictly positive gaps of a sorted timeline; NaN if none.
pub fn median_positive_gap(sorted: &[f64]) -> f64 {
    let mut gaps: Vec<f64> = consecutive_diffs(sorted)
        .into_iter()
        .filter(|d| *d > 0.0)
        .collect();
    gaps.sort_by(f64::total_cmp);
    crate::stats::median(&gaps)
}

/// Interval statistics over consecutive gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSummary {
    /// Number of gaps
    pub n: usize,
    /// Lower median gap
    pub median: f64,
    /// Q3 minus Q1 (index quantiles)
    pub iqr: f64,
    /// Most common gap after rounding to `unit`
    pub mode: f64,
    /// Display unit chosen from the largest gap
    pub unit: TimeUnit,
}

/// Picks a display unit for millisecond gaps from the largest gap.
pub fn choose_duration_unit(max_ms: f64) -> TimeUnit {
    if max_ms >= DAY_MS {
        TimeUnit::Day
    } else if max_ms >= HOUR_MS {
        TimeUnit::Hour
    } else if max_ms >= MINUTE_MS {
        TimeUnit::Minute
    } else {
        TimeUnit::Second
    }
}

/// Picks a display unit for time-of-day gaps (seconds) from the largest gap.
pub fn choose_time_unit(max_sec: f64) -> TimeUnit {
    if max_sec >= 3600.0 {
        TimeUnit::Hour
    } else if max_sec >= 60.0 {
        TimeUnit::Minute
    } else {
        TimeUnit::Second
    }
}

/// Summarizes gaps. Gaps are milliseconds, or seconds when `time_of_day`.
///
/// Returns `None` for an empty gap list.
pub fn interval_summary(diffs: &[f64], time_of_day: bool) -> Option<IntervalSummary> {
    if diffs.is_empty() {
        return None;
    }
    let mut sorted = diffs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let q = |p: f64| sorted[((n - 1) as f64 * p).floor() as usize];
    let largest = sorted[n - 1];

    let unit = if time_of_day {
        choose_time_unit(largest)
    } else {
        choose_duration_unit(largest)
    };
    let step = if time_of_day {
        unit.millis() / 1000.0
    } else {
        unit.millis()
    };

    // First-seen wins ties, matching insertion order over the sorted gaps
    let mut counts: HashMap<u64, usize> = HashMap::new();
    let mut order: Vec<f64> = Vec::new();
    for v in &sorted {
        let rounded = (v / step).round() * step;
        let count = counts.entry(rounded.to_bits()).or_insert(0);
        if *count == 0 {
            order.push(rounded);
        }
        *count += 1;
    }
    let mut mode = order[0];
    let mut best = 0;
    for v in order {
        let c = counts.get(&v.to_bits()).copied().unwrap_or(0);
        if c > best {
            best = c;
            mode = v;
        }
    }

    Some(IntervalSummary {
        n,
        median: q(0.5),
        iqr: q(0.75) - q(0.25),
        mode,
        unit,
    })
}

/// Calendar granularity for date histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBucketUnit {
    /// `YYYY-MM-DD`
    Day,
    /// ISO week, `YYYY-Www`
    Week,
    /// `YYYY-MM`
    Month,
    /// `YYYY`
    Year,
}

/// Chooses a bucket unit from the span of a timeline.
pub fn choose_date_bucket_unit(span_ms: f64) -> DateBucketUnit {
    if span_ms <= 90.0 * DAY_MS {
        DateBucketUnit::Day
    } else if span_ms <= 730.0 * DAY_MS {
        DateBucketUnit::Week
    } else if span_ms <= 5.0 * 365.0 * DAY_MS {
        DateBucketUnit::Month
    } else {
        DateBucketUnit::Year
    }
}

/// Labelled counts for a temporal histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Buckets {
    /// Bucket unit, absent for time-of-day buckets
    pub unit: Option<DateBucketUnit>,
    /// Bucket labels in ascending order
    pub labels: Vec<String>,
    /// Count per label
    pub counts: Vec<usize>,
}

/// Buckets epoch milliseconds by a calendar unit chosen from their span.
pub fn bucket_date_times(ms_list: &[f64]) -> Buckets {
    let finite: Vec<f64> = ms_list.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Buckets::default();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let unit = choose_date_bucket_unit(max - min);

    let mut map: BTreeMap<String, usize> = BTreeMap::new();
    for t in finite {
        let Some(d) = local_datetime(t) else { continue };
        let label = match unit {
            DateBucketUnit::Day => d.format("%Y-%m-%d").to_string(),
            DateBucketUnit::Week => {
                let week = d.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            DateBucketUnit::Month => format!("{}-{:02}", d.year(), d.month()),
            DateBucketUnit::Year => d.year().to_string(),
        };
        *map.entry(label).or_insert(0) += 1;
    }
    let (labels, counts) = map.into_iter().unzip();
    Buckets {
        unit: Some(unit),
        labels,
        counts,
    }
}

/// Buckets seconds-since-midnight into 24 hourly bins (`00:00`..`23:00`).
///
/// Values outside a single day are ignored.
pub fn bucket_times_of_day(secs: &[f64]) -> Buckets {
    if secs.is_empty() {
        return Buckets::default();
    }
    let mut counts = vec![0usize; 24];
    for s in secs.iter().filter(|s| s.is_finite() && **s >= 0.0) {
        if let Some(slot) = counts.get_mut((s / 3600.0).floor() as usize) {
            *slot += 1;
        }
    }
    Buckets {
        unit: None,
        labels: (0..24).map(|h| format!("{:02}:00", h)).collect(),
        counts,
    }
}

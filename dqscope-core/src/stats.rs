//! Statistical primitives for profiling and outlier detection.
//!
//! Functions that take `sorted` expect ascending input and return NaN for
//! empty input rather than failing.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::inference::parse_number;

/// Converts a raw MAD into a normal-consistent sigma estimate.
pub const MAD_SIGMA_SCALE: f64 = 1.4826;

/// Samples below this size use percentile trimming for outlier bounds.
pub const SMALL_SAMPLE_SIZE: usize = 80;

/// Linear-interpolated quantile of ascending data; NaN when empty.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (sorted.len() - 1) as f64 * p;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let h = pos - lo as f64;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] * (1.0 - h) + sorted[hi] * h
    }
}

/// Median of ascending data; NaN when empty.
pub fn median(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let m = (sorted.len() - 1) as f64 / 2.0;
    (sorted[m.floor() as usize] + sorted[m.ceil() as usize]) / 2.0
}

/// Raw median absolute deviation from the median (unscaled).
pub fn mad(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    let med = median(&x);
    let mut dev: Vec<f64> = x.iter().map(|v| (v - med).abs()).collect();
    dev.sort_by(f64::total_cmp);
    median(&dev)
}

/// Bowley quartile skewness, guarding against a zero IQR.
pub fn bowley_skew(q1: f64, q2: f64, q3: f64) -> f64 {
    let spread = q3 - q1;
    let denom = if spread == 0.0 || spread.is_nan() {
        1e-12
    } else {
        spread
    };
    (q3 + q1 - 2.0 * q2) / denom
}

/// How outlier bounds were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsMethod {
    /// 5th/95th percentile trimming for small samples
    #[serde(rename = "p5-95")]
    Percentile5To95,
    /// Median ± 3.5 MAD-sigma for skewed data
    #[serde(rename = "MAD±3.5σ")]
    MadSigma,
    /// Tukey fences
    #[serde(rename = "IQR±1.5")]
    Iqr,
    /// 1st/99th percentile fallback for flat data
    #[serde(rename = "p1-99")]
    Percentile1To99,
    /// No data
    #[serde(rename = "none")]
    None,
}

impl BoundsMethod {
    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Percentile5To95 => "p5-95",
            Self::MadSigma => "MAD±3.5σ",
            Self::Iqr => "IQR±1.5",
            Self::Percentile1To99 => "p1-99",
            Self::None => "none",
        }
    }
}

/// Inclusive bounds outside of which values are outliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    /// Lower bound
    pub lo: f64,
    /// Upper bound
    pub hi: f64,
    /// Method used
    pub method: BoundsMethod,
}

impl OutlierBounds {
    /// Returns true if both bounds are finite and distinct.
    pub fn is_usable(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite() && self.lo != self.hi
    }

    /// Returns true if `v` lies outside the bounds.
    pub fn is_outlier(&self, v: f64) -> bool {
        v < self.lo || v > self.hi
    }
}

/// Chooses outlier bounds robust to sample size and skew.
///
/// Small samples use p5/p95. Otherwise heavily skewed data (|Bowley| ≥ 0.4)
/// with a positive MAD uses median ± 3.5σ, then Tukey fences when the IQR is
/// positive, and p1/p99 as the last resort.
pub fn robust_outlier_bounds(values: &[f64]) -> OutlierBounds {
    if values.is_empty() {
        return OutlierBounds {
            lo: f64::NAN,
            hi: f64::NAN,
            method: BoundsMethod::None,
        };
    }
    let mut s = values.to_vec();
    s.sort_by(f64::total_cmp);

    if s.len() < SMALL_SAMPLE_SIZE {
        return OutlierBounds {
            lo: quantile(&s, 0.05),
            hi: quantile(&s, 0.95),
            method: BoundsMethod::Percentile5To95,
        };
    }

    let q1 = quantile(&s, 0.25);
    let q2 = quantile(&s, 0.50);
    let q3 = quantile(&s, 0.75);
    let iqr = q3 - q1;
    let sigma = MAD_SIGMA_SCALE * mad(&s);

    if bowley_skew(q1, q2, q3).abs() >= 0.4 && sigma.is_finite() && sigma > 0.0 {
        return OutlierBounds {
            lo: q2 - 3.5 * sigma,
            hi: q2 + 3.5 * sigma,
            method: BoundsMethod::MadSigma,
        };
    }

    if iqr.is_finite() && iqr > 0.0 {
        return OutlierBounds {
            lo: q1 - 1.5 * iqr,
            hi: q3 + 1.5 * iqr,
            method: BoundsMethod::Iqr,
        };
    }

    OutlierBounds {
        lo: quantile(&s, 0.01),
        hi: quantile(&s, 0.99),
        method: BoundsMethod::Percentile1To99,
    }
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Histogram {
    /// Bin centers
    pub centers: Vec<f64>,
    /// Count per bin
    pub counts: Vec<usize>,
    /// `k + 1` bin edges
    pub edges: Vec<f64>,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Bin width (0 for a degenerate single bin)
    pub width: f64,
}

/// Builds a histogram with Sturges' bin count, or `k_override` when given.
///
/// The bin count is clamped to `[3, max_bins]`. Identical values produce a
/// single degenerate bin; the maximum value lands in the last bin.
pub fn build_histogram(values: &[f64], k_override: Option<usize>, max_bins: usize) -> Histogram {
    if values.is_empty() {
        return Histogram::default();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Histogram {
            centers: vec![min],
            counts: vec![values.len()],
            edges: vec![min, max],
            min,
            max,
            width: 0.0,
        };
    }

    let sturges = ((values.len() as f64).log2() + 1.0).ceil() as usize;
    let k = k_override.unwrap_or(sturges).clamp(3, max_bins.max(3));
    let width = (max - min) / k as f64;
    let edges: Vec<f64> = (0..=k).map(|i| min + i as f64 * width).collect();

    let mut counts = vec![0usize; k];
    for v in values {
        let bin = (((v - min) / width).floor().max(0.0) as usize).min(k - 1);
        counts[bin] += 1;
    }
    let centers = edges.windows(2).map(|e| (e[0] + e[1]) / 2.0).collect();

    Histogram {
        centers,
        counts,
        edges,
        min,
        max,
        width,
    }
}

/// Summary statistics for a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NumericSummary {
    /// Count of finite numeric values
    pub n: usize,
    /// Total rows in the column
    pub total: usize,
    /// Missing cells (null or empty)
    pub missing: usize,
    /// Distinct non-missing raw values
    pub distinct: usize,
    /// Arithmetic mean
    pub mean: Option<f64>,
    /// Population standard deviation
    pub std: Option<f64>,
    /// Minimum
    pub min: Option<f64>,
    /// Maximum
    pub max: Option<f64>,
    /// 5th percentile
    pub q05: Option<f64>,
    /// First quartile
    pub q25: Option<f64>,
    /// Median
    pub q50: Option<f64>,
    /// Third quartile
    pub q75: Option<f64>,
    /// 95th percentile
    pub q95: Option<f64>,
}

/// Computes a [`NumericSummary`] from the non-missing values of a column.
///
/// `total` is the full row count; non-numeric values count towards
/// `distinct` but not `n`.
pub fn numeric_summary(non_missing: &[&str], total: usize) -> NumericSummary {
    let distinct = non_missing.iter().collect::<HashSet<_>>().len();
    let mut x: Vec<f64> = non_missing.iter().filter_map(|v| parse_number(v)).collect();
    let mut summary = NumericSummary {
        n: x.len(),
        total,
        missing: total.saturating_sub(non_missing.len()),
        distinct,
        ..NumericSummary::default()
    };
    if x.is_empty() {
        return summary;
    }
    x.sort_by(f64::total_cmp);
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    summary.mean = Some(mean);
    summary.std = Some(variance.sqrt());
    summary.min = x.first().copied();
    summary.max = x.last().copied();
    summary.q05 = Some(quantile(&x, 0.05));
    summary.q25 = Some(quantile(&x, 0.25));
    summary.q50 = Some(quantile(&x, 0.50));
    summary.q75 = Some(quantile(&x, 0.75));
    summary.q95 = Some(quantile(&x, 0.95));
    summary
}

/// One entry of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    /// Raw value
    pub value: String,
    /// Occurrences
    pub count: usize,
    /// Share of all counted values, in percent
    pub pct: f64,
}

/// Counts occurrences preserving first-seen order.
pub(crate) fn frequencies<'a, I>(values: I) -> Vec<(&'a str, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<(&str, usize)> = Vec::new();
    for v in values {
        if let Some(&i) = index.get(v) {
            out[i].1 += 1;
        } else {
            index.insert(v, out.len());
            out.push((v, 1));
        }
    }
    out
}

/// The `n` most frequent values, ties kept in first-seen order.
pub fn top_n(values: &[&str], n: usize) -> Vec<Frequency> {
    let total = values.len();
    let mut freq = frequencies(values.iter().copied());
    freq.sort_by(|a, b| b.1.cmp(&a.1));
    freq.into_iter()
        .take(n)
        .map(|(value, count)| Frequency {
            value: value.to_string(),
            count,
            pct: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
        })
        .collect()
}

/// Rounds to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compact display form: fewer decimals for larger magnitudes.
pub fn smart_number(x: f64) -> String {
    if !x.is_finite() {
        return "—".to_string();
    }
    let abs = x.abs();
    let decimals = if abs >= 1000.0 {
        0
    } else if abs >= 100.0 {
        1
    } else if abs >= 10.0 {
        2
    } else if abs >= 1.0 {
        3
    } else {
        4
    };
    let text = format!("{:.*}", decimals, x);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_and_median() {
        let s = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&s, 0.0), 1.0);
        assert_eq!(quantile(&s, 1.0), 4.0);
        assert_eq!(quantile(&s, 0.5), 2.5);
        assert!((quantile(&s, 0.25) - 1.75).abs() < 1e-12);
        assert_eq!(median(&s), 2.5);
        assert_eq!(median(&[3.0]), 3.0);
        assert!(quantile(&[], 0.5).is_nan());
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn test_mad_is_unscaled() {
        // deviations from median 3: 2,1,0,1,2 -> median 1
        assert_eq!(mad(&[5.0, 1.0, 3.0, 2.0, 4.0]), 1.0);
        assert!(mad(&[]).is_nan());
    }

    #[test]
    fn test_bowley_skew_zero_spread() {
        assert_eq!(bowley_skew(1.0, 1.0, 1.0), 0.0);
        assert!(bowley_skew(0.0, 0.1, 1.0) > 0.0);
    }

    #[test]
    fn test_small_sample_uses_p5_p95() {
        let values: Vec<f64> = (1..=11).map(f64::from).chain([1000.0]).collect();
        let bounds = robust_outlier_bounds(&values);
        assert_eq!(bounds.method, BoundsMethod::Percentile5To95);
        assert!(bounds.is_usable());
        assert!(bounds.is_outlier(1000.0));
        assert!(!bounds.is_outlier(6.0));
    }

    #[test]
    fn test_large_symmetric_sample_uses_iqr() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let bounds = robust_outlier_bounds(&values);
        assert_eq!(bounds.method, BoundsMethod::Iqr);
        assert!((bounds.lo - (24.75 - 1.5 * 49.5)).abs() < 1e-9);
    }

    #[test]
    fn test_large_skewed_sample_uses_mad() {
        // Dense low mass with a long right tail
        let mut values: Vec<f64> = vec![0.0; 30];
        values.extend((0..30).map(|_| 1.0));
        values.extend((0..40).map(|i| 2.0 + f64::from(i) * 10.0));
        let bounds = robust_outlier_bounds(&values);
        assert_eq!(bounds.method, BoundsMethod::MadSigma);
    }

    #[test]
    fn test_flat_large_sample_falls_back_to_p1_p99() {
        let values = vec![5.0; 100];
        let bounds = robust_outlier_bounds(&values);
        assert_eq!(bounds.method, BoundsMethod::Percentile1To99);
        assert!(!bounds.is_usable());
        assert_eq!(robust_outlier_bounds(&[]).method, BoundsMethod::None);
    }

    #[test]
    fn test_histogram() {
        let h = build_histogram(&[1.0, 2.0, 3.0, 4.0], None, 200);
        assert_eq!(h.counts.len(), 3);
        assert_eq!(h.counts.iter().sum::<usize>(), 4);
        assert_eq!(h.edges.len(), 4);
        assert_eq!(*h.counts.last().unwrap(), 2);

        let degenerate = build_histogram(&[7.0, 7.0], None, 200);
        assert_eq!(degenerate.counts, vec![2]);
        assert_eq!(degenerate.width, 0.0);

        let overridden = build_histogram(&[0.0, 10.0], Some(500), 60);
        assert_eq!(overridden.counts.len(), 60);
        assert!(build_histogram(&[], None, 60).counts.is_empty());
    }

    #[test]
    fn test_numeric_summary() {
        let s = numeric_summary(&["1", "2", "3", "4", "x"], 7);
        assert_eq!(s.n, 4);
        assert_eq!(s.total, 7);
        assert_eq!(s.missing, 2);
        assert_eq!(s.distinct, 5);
        assert_eq!(s.mean, Some(2.5));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(4.0));
        assert!((s.std.unwrap() - 1.25f64.sqrt()).abs() < 1e-12);

        let empty = numeric_summary(&[], 3);
        assert_eq!(empty.n, 0);
        assert!(empty.mean.is_none());
    }

    #[test]
    fn test_top_n_ties_keep_first_seen() {
        let top = top_n(&["b", "a", "a", "b", "c"], 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].value, "b");
        assert_eq!(top[1].value, "a");
        assert_eq!(top[0].pct, 40.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_smart_number() {
        assert_eq!(smart_number(1234.56), "1235");
        assert_eq!(smart_number(123.45), "123.5");
        assert_eq!(smart_number(12.0), "12");
        assert_eq!(smart_number(1.5), "1.5");
        assert_eq!(smart_number(0.123_456), "0.1235");
        assert_eq!(smart_number(f64::NAN), "—");
    }
}

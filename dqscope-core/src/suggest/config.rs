//! Suggestion engine configuration.
//!
//! Thresholds for the column-profiling heuristics. Defaults reproduce the
//! stock behavior; builder methods clamp out-of-range input with a warning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Heuristic thresholds for suggestion generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Missing share (percent) at which a column is flagged
    pub missing_min_pct: f64,
    /// Missing share (percent) at which the flag becomes high severity
    pub missing_high_pct: f64,
    /// Minimum numeric values before outlier bounds are proposed
    pub outlier_min_values: usize,
    /// Minimum outlier share (percent) worth a suggestion
    pub outlier_min_pct: f64,
    /// Outlier share (percent) at which severity becomes high
    pub outlier_high_pct: f64,
    /// Minimum non-missing values before a pattern is inferred
    pub pattern_min_values: usize,
    /// Values sampled for pattern inference
    pub pattern_sample_size: usize,
    /// Most frequent distinct values fed to regex inference
    pub pattern_top_values: usize,
    /// Case share (percent) that triggers a case-normalization hint
    pub case_dominance_pct: f64,
    /// Minimum non-missing values before enumerating classes
    pub class_min_values: usize,
    /// Largest distinct count still treated as a class list
    pub class_max_distinct: usize,
    /// Row share (percent) the class list must cover
    pub class_min_coverage_pct: f64,
    /// Minimum distinct values before uniqueness is considered
    pub uniq_min_distinct: usize,
    /// Minimum distinct/non-missing ratio for a near-unique column
    pub uniq_min_ratio: f64,
    /// Maximum duplicate ratio for a near-unique column
    pub uniq_max_dup_ratio: f64,
    /// Duplicate ratio at or under which violations are high severity
    pub uniq_high_dup_ratio: f64,
    /// Trim, collapse spaces and lower-case before comparing values
    pub uniq_normalize_strings: bool,
    /// Columns scanned pairwise for a composite key
    pub composite_max_candidates: usize,
    /// Minimum non-empty pairs before a composite key is judged
    pub composite_min_samples: usize,
    /// Minimum pair uniqueness ratio
    pub composite_min_ratio: f64,
    /// Maximum pair duplicate ratio
    pub composite_max_dup_ratio: f64,
    /// Minimum values before temporal windows are proposed
    pub temporal_min_values: usize,
}

/// Validation errors for suggestion configuration.
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("{field} must be between 0.0 and 1.0, got {value}")]
    InvalidRatio { field: &'static str, value: f64 },
    #[error("{field} must be between 0 and 100, got {value}")]
    InvalidPercent { field: &'static str, value: f64 },
    #[error("{field} must be greater than zero")]
    ZeroCount { field: &'static str },
    #[error("missing_min_pct ({min}) must not exceed missing_high_pct ({high})")]
    InvertedMissingness { min: f64, high: f64 },
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            missing_min_pct: 5.0,
            missing_high_pct: 20.0,
            outlier_min_values: 12,
            outlier_min_pct: 1.0,
            outlier_high_pct: 10.0,
            pattern_min_values: 8,
            pattern_sample_size: 200,
            pattern_top_values: 12,
            case_dominance_pct: 70.0,
            class_min_values: 8,
            class_max_distinct: 20,
            class_min_coverage_pct: 90.0,
            uniq_min_distinct: 20,
            uniq_min_ratio: 0.90,
            uniq_max_dup_ratio: 0.10,
            uniq_high_dup_ratio: 0.02,
            uniq_normalize_strings: true,
            composite_max_candidates: 12,
            composite_min_samples: 30,
            composite_min_ratio: 0.98,
            composite_max_dup_ratio: 0.02,
            temporal_min_values: 12,
        }
    }
}

fn clamp_percent(field: &str, value: f64) -> f64 {
    if !(0.0..=100.0).contains(&value) {
        tracing::warn!("{} {} clamped to valid range [0, 100]", field, value);
    }
    value.clamp(0.0, 100.0)
}

fn clamp_ratio(field: &str, value: f64) -> f64 {
    if !(0.0..=1.0).contains(&value) {
        tracing::warn!("{} {} clamped to valid range [0.0, 1.0]", field, value);
    }
    value.clamp(0.0, 1.0)
}

impl SuggestionConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the missingness thresholds (percent).
    #[must_use]
    pub fn with_missingness(mut self, min_pct: f64, high_pct: f64) -> Self {
        self.missing_min_pct = clamp_percent("missing_min_pct", min_pct);
        self.missing_high_pct = clamp_percent("missing_high_pct", high_pct);
        self
    }

    /// Builder method to set the minimum outlier share (percent).
    #[must_use]
    pub fn with_outlier_min_pct(mut self, pct: f64) -> Self {
        self.outlier_min_pct = clamp_percent("outlier_min_pct", pct);
        self
    }

    /// Builder method to set the class-list limits.
    #[must_use]
    pub fn with_class_limits(mut self, max_distinct: usize, min_coverage_pct: f64) -> Self {
        self.class_max_distinct = max_distinct;
        self.class_min_coverage_pct = clamp_percent("class_min_coverage_pct", min_coverage_pct);
        self
    }

    /// Builder method to set the near-unique ratios.
    #[must_use]
    pub fn with_uniqueness(mut self, min_ratio: f64, max_dup_ratio: f64) -> Self {
        self.uniq_min_ratio = clamp_ratio("uniq_min_ratio", min_ratio);
        self.uniq_max_dup_ratio = clamp_ratio("uniq_max_dup_ratio", max_dup_ratio);
        self
    }

    /// Builder method to set the minimum distinct count for uniqueness.
    #[must_use]
    pub fn with_uniq_min_distinct(mut self, min_distinct: usize) -> Self {
        self.uniq_min_distinct = min_distinct;
        self
    }

    /// Builder method to enable/disable string normalization for uniqueness.
    #[must_use]
    pub fn with_normalize_strings(mut self, normalize: bool) -> Self {
        self.uniq_normalize_strings = normalize;
        self
    }

    /// Builder method to set the minimum value count for temporal windows.
    #[must_use]
    pub fn with_temporal_min_values(mut self, min_values: usize) -> Self {
        self.temporal_min_values = min_values;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if a ratio or percentage is out of range, a sample
    /// size is zero, or the missingness thresholds are inverted.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let percents = [
            ("missing_min_pct", self.missing_min_pct),
            ("missing_high_pct", self.missing_high_pct),
            ("outlier_min_pct", self.outlier_min_pct),
            ("outlier_high_pct", self.outlier_high_pct),
            ("case_dominance_pct", self.case_dominance_pct),
            ("class_min_coverage_pct", self.class_min_coverage_pct),
        ];
        for (field, value) in percents {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigValidationError::InvalidPercent { field, value });
            }
        }
        let ratios = [
            ("uniq_min_ratio", self.uniq_min_ratio),
            ("uniq_max_dup_ratio", self.uniq_max_dup_ratio),
            ("uniq_high_dup_ratio", self.uniq_high_dup_ratio),
            ("composite_min_ratio", self.composite_min_ratio),
            ("composite_max_dup_ratio", self.composite_max_dup_ratio),
        ];
        for (field, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidRatio { field, value });
            }
        }
        let counts = [
            ("pattern_sample_size", self.pattern_sample_size),
            ("pattern_top_values", self.pattern_top_values),
            ("class_max_distinct", self.class_max_distinct),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigValidationError::ZeroCount { field });
            }
        }
        if self.missing_min_pct > self.missing_high_pct {
            return Err(ConfigValidationError::InvertedMissingness {
                min: self.missing_min_pct,
                high: self.missing_high_pct,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_config_default() {
        let config = SuggestionConfig::default();
        assert_eq!(config.missing_min_pct, 5.0);
        assert_eq!(config.missing_high_pct, 20.0);
        assert_eq!(config.outlier_min_values, 12);
        assert_eq!(config.class_max_distinct, 20);
        assert_eq!(config.uniq_min_ratio, 0.90);
        assert!(config.uniq_normalize_strings);
        assert_eq!(config.composite_max_candidates, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_clamps() {
        let config = SuggestionConfig::new()
            .with_missingness(-5.0, 150.0)
            .with_uniqueness(1.5, -0.1)
            .with_class_limits(5, 95.0)
            .with_normalize_strings(false);
        assert_eq!(config.missing_min_pct, 0.0);
        assert_eq!(config.missing_high_pct, 100.0);
        assert_eq!(config.uniq_min_ratio, 1.0);
        assert_eq!(config.uniq_max_dup_ratio, 0.0);
        assert_eq!(config.class_max_distinct, 5);
        assert!(!config.uniq_normalize_strings);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_direct_assignment() {
        let config = SuggestionConfig {
            composite_min_ratio: 1.2,
            ..SuggestionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidRatio {
                field: "composite_min_ratio",
                ..
            })
        ));

        let config = SuggestionConfig {
            pattern_sample_size: 0,
            ..SuggestionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SuggestionConfig::new().with_missingness(30.0, 10.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvertedMissingness { .. })
        ));
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: SuggestionConfig =
            serde_json::from_str(r#"{"class_max_distinct": 10}"#).unwrap();
        assert_eq!(config.class_max_distinct, 10);
        assert_eq!(config.missing_min_pct, 5.0);
    }
}

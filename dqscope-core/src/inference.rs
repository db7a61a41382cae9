//! Semantic type inference over column samples.
//!
//! Types are re-inferred on demand and never cached: a column's type can
//! change whenever the dataset changes.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DqError;
use crate::models::Dataset;

/// Number of leading non-missing values sampled for inference.
pub const INFERENCE_SAMPLE_SIZE: usize = 10;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Free text
    #[default]
    String,
    /// Finite numbers
    Numeric,
    /// Whole numbers (only ever declared by the rule author, never inferred)
    Integer,
    /// `YYYY-MM-DD`
    Date,
    /// `HH:MM[:SS]`
    Time,
    /// `YYYY-MM-DD[ T]HH:MM[:SS][.fff][offset]`
    Datetime,
    /// true/false, yes/no, 0/1
    Boolean,
}

impl SemanticType {
    /// Lowercase name as used in rule documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Integer => "integer",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
        }
    }

    /// Numeric or integer.
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Numeric | Self::Integer)
    }

    /// Date, time or datetime.
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Datetime)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = DqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "numeric" => Ok(Self::Numeric),
            "integer" => Ok(Self::Integer),
            "date" => Ok(Self::Date),
            "time" => Ok(Self::Time),
            "datetime" => Ok(Self::Datetime),
            "boolean" => Ok(Self::Boolean),
            other => Err(DqError::configuration(format!(
                "unknown data type '{}'",
                other
            ))),
        }
    }
}

/// Pre-compiled shape patterns shared by inference and temporal parsing.
pub(crate) struct ShapePatterns {
    /// `YYYY-MM-DD`
    pub(crate) date: Regex,
    /// `HH:MM[:SS]`, captures hour, minute, second
    pub(crate) time: Regex,
    /// Full datetime with optional seconds, fraction and offset
    pub(crate) datetime: Regex,
    /// Date with optional time part, captured for parsing
    pub(crate) timestamp: Regex,
}

impl ShapePatterns {
    /// Gets the singleton instance, or `None` if compilation failed.
    pub(crate) fn instance() -> Option<&'static Self> {
        static PATTERNS: OnceLock<Option<ShapePatterns>> = OnceLock::new();
        PATTERNS
            .get_or_init(|| match Self::compile() {
                Ok(patterns) => Some(patterns),
                Err(e) => {
                    tracing::error!("Failed to compile shape patterns: {}", e);
                    None
                }
            })
            .as_ref()
    }

    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            date: Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$")?,
            time: Regex::new(r"^([0-9]{2}):([0-9]{2})(?::([0-9]{2}))?$")?,
            datetime: Regex::new(
                r"^[0-9]{4}-[0-9]{2}-[0-9]{2}[ T][0-9]{2}:[0-9]{2}(:[0-9]{2})?(\.[0-9]+)?(Z|[+-][0-9]{2}:?[0-9]{2})?$",
            )?,
            timestamp: Regex::new(
                r"^([0-9]{4})-([0-9]{2})-([0-9]{2})(?:[ T]([0-9]{2}):([0-9]{2})(?::([0-9]{2}))?(?:\.([0-9]+))?)?(Z|z|[+-][0-9]{2}:?[0-9]{2})?$",
            )?,
        })
    }
}

/// Parses a number the way loosely-typed spreadsheets do.
///
/// Surrounding whitespace is ignored, `0x`/`0o`/`0b` prefixes are accepted,
/// and only finite results count. Blank input is not a number.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let radix = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| s.strip_prefix(prefix).map(|digits| (digits, radix)));
    if let Some((digits, radix)) = radix {
        return u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
    }
    // Rust accepts "inf"/"nan" spellings that are not numbers here
    if s.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_boolean_like(v: &str) -> bool {
    matches!(
        v.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "0" | "1"
    )
}

/// Infers the semantic type of a sample of already-trimmed, non-missing values.
///
/// The combined date-or-datetime check runs first, so a column holding only
/// `YYYY-MM-DD` values is reported as [`SemanticType::Datetime`], never
/// [`SemanticType::Date`]. Downstream parsing treats a bare date inside a
/// datetime column as local midnight.
pub fn infer_type<S: AsRef<str>>(sample: &[S]) -> SemanticType {
    if sample.is_empty() {
        return SemanticType::String;
    }
    let Some(patterns) = ShapePatterns::instance() else {
        return SemanticType::String;
    };
    let all = |pred: &dyn Fn(&str) -> bool| sample.iter().all(|v| pred(v.as_ref()));

    if all(&|v| patterns.date.is_match(v) || patterns.datetime.is_match(v)) {
        return SemanticType::Datetime;
    }

    let all_numeric = all(&|v| parse_number(v).is_some());
    let all_boolean_like = all(&is_boolean_like);
    let only_zero_one = all(&|v| v == "0" || v == "1");

    if all_boolean_like && (!all_numeric || only_zero_one) {
        SemanticType::Boolean
    } else if all(&|v| patterns.time.is_match(v)) {
        SemanticType::Time
    } else if all(&|v| patterns.datetime.is_match(v)) {
        SemanticType::Datetime
    } else if all(&|v| patterns.date.is_match(v)) {
        SemanticType::Date
    } else if all_numeric {
        SemanticType::Numeric
    } else {
        SemanticType::String
    }
}

/// Infers a column's type from its first non-missing values.
///
/// Unknown columns infer as [`SemanticType::String`].
pub fn infer_column_type(dataset: &Dataset, column: &str) -> SemanticType {
    let sample: Vec<&str> = dataset
        .non_missing_values(column)
        .into_iter()
        .take(INFERENCE_SAMPLE_SIZE)
        .map(str::trim)
        .collect();
    infer_type(&sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sample_is_string() {
        let empty: [&str; 0] = [];
        assert_eq!(infer_type(&empty), SemanticType::String);
    }

    #[test]
    fn test_date_only_column_reports_datetime() {
        // Pure YYYY-MM-DD short-circuits through the combined date/datetime
        // check before the dedicated date branch is reached.
        let sample = ["2024-01-01", "2024-01-02", "2024-01-03"];
        assert_eq!(infer_type(&sample), SemanticType::Datetime);
    }

    #[test]
    fn test_mixed_date_and_datetime() {
        let sample = ["2024-01-01", "2024-01-02 10:30", "2024-01-03T08:00:00Z"];
        assert_eq!(infer_type(&sample), SemanticType::Datetime);
    }

    #[test]
    fn test_boolean_detection() {
        assert_eq!(infer_type(&["yes", "No", "TRUE"]), SemanticType::Boolean);
        assert_eq!(infer_type(&["0", "1", "1"]), SemanticType::Boolean);
        assert_eq!(infer_type(&["0", "1", "2"]), SemanticType::Numeric);
        assert_eq!(infer_type(&["1", "yes"]), SemanticType::Boolean);
    }

    #[test]
    fn test_time_detection() {
        assert_eq!(infer_type(&["08:00", "09:15:30"]), SemanticType::Time);
        assert_eq!(infer_type(&["8:00"]), SemanticType::String);
    }

    #[test]
    fn test_numeric_and_string() {
        assert_eq!(infer_type(&["1.5", "-2", "3e2"]), SemanticType::Numeric);
        assert_eq!(infer_type(&["1.5", "abc"]), SemanticType::String);
        assert_eq!(infer_type(&["Infinity"]), SemanticType::String);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("0x1F"), Some(31.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("12abc"), None);
    }

    #[test]
    fn test_infer_column_uses_first_ten_non_missing() {
        let mut rows: Vec<Vec<Option<String>>> = vec![vec![None], vec![Some(String::new())]];
        rows.extend((0..10).map(|i| vec![Some(format!(" {} ", i + 10))]));
        rows.push(vec![Some("not a number".into())]);
        let ds = Dataset::from_rows(vec!["n".into()], rows).unwrap();
        assert_eq!(infer_column_type(&ds, "n"), SemanticType::Numeric);
        assert_eq!(infer_column_type(&ds, "missing"), SemanticType::String);
    }

    #[test]
    fn test_semantic_type_round_trip() {
        for ty in [
            SemanticType::String,
            SemanticType::Numeric,
            SemanticType::Integer,
            SemanticType::Date,
            SemanticType::Time,
            SemanticType::Datetime,
            SemanticType::Boolean,
        ] {
            assert_eq!(ty.as_str().parse::<SemanticType>().unwrap(), ty);
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty));
        }
        assert!("float".parse::<SemanticType>().is_err());
    }
}

//! Typed access to loosely-typed rule parameters.
//!
//! Parameters arrive from rule documents and form inputs, so numbers may be
//! JSON numbers or numeric strings and lists may be arrays or delimited text.

use serde_json::{Map, Value};

use crate::inference::parse_number;

/// Reads a finite number from a JSON number or numeric string.
pub(crate) fn number(params: &Map<String, Value>, key: &str) -> Option<f64> {
    match params.get(key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Reads a non-empty scalar as text.
pub(crate) fn text(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a list of strings from an array or from text split on commas/newlines.
///
/// Blank entries are dropped; `None` when nothing remains.
pub(crate) fn string_list(params: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let values: Vec<String> = match params.get(key)? {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) => s
            .split([',', '\n', '\r'])
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        _ => return None,
    };
    (!values.is_empty()).then_some(values)
}

/// Cadence tolerance: `tolerance`, else `toleranceMultiplier`, else 1.5.
///
/// Zero or unreadable entries fall through to the next source.
pub(crate) fn tolerance(params: &Map<String, Value>) -> f64 {
    number(params, "tolerance")
        .filter(|t| *t != 0.0)
        .or_else(|| number(params, "toleranceMultiplier").filter(|t| *t != 0.0))
        .unwrap_or(DEFAULT_CADENCE_TOLERANCE)
}

/// Multiplier applied to a cadence window when none is given.
pub(crate) const DEFAULT_CADENCE_TOLERANCE: f64 = 1.5;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_number_accepts_strings() {
        let p = map(json!({"a": 3, "b": "4.5", "c": "x", "d": "", "e": null}));
        assert_eq!(number(&p, "a"), Some(3.0));
        assert_eq!(number(&p, "b"), Some(4.5));
        assert_eq!(number(&p, "c"), None);
        assert_eq!(number(&p, "d"), None);
        assert_eq!(number(&p, "e"), None);
        assert_eq!(number(&p, "missing"), None);
    }

    #[test]
    fn test_text() {
        let p = map(json!({"a": "x", "b": "", "c": 5, "d": false}));
        assert_eq!(text(&p, "a").as_deref(), Some("x"));
        assert_eq!(text(&p, "b"), None);
        assert_eq!(text(&p, "c").as_deref(), Some("5"));
        assert_eq!(text(&p, "d").as_deref(), Some("false"));
    }

    #[test]
    fn test_string_list_forms() {
        let p = map(json!({"arr": ["a", 1, null], "txt": "x, y\nz,,", "empty": "  ,"}));
        assert_eq!(string_list(&p, "arr").unwrap(), vec!["a", "1"]);
        assert_eq!(string_list(&p, "txt").unwrap(), vec!["x", "y", "z"]);
        assert_eq!(string_list(&p, "empty"), None);
    }

    #[test]
    fn test_tolerance_fallbacks() {
        assert_eq!(tolerance(&map(json!({}))), 1.5);
        assert_eq!(tolerance(&map(json!({"tolerance": 2}))), 2.0);
        assert_eq!(tolerance(&map(json!({"tolerance": 0, "toleranceMultiplier": 3}))), 3.0);
    }
}

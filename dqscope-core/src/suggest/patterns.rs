//! String shape heuristic: regex inference plus formatting hints.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    ProfilingContext, RuleProposal, Severity, Suggestion, SuggestionHeuristic, TransformHint,
    TransformKind,
};
use crate::inference::SemanticType;
use crate::rules::{ConditionType, QualityDimension};
use crate::stats::top_n;

/// Block-splitting and whitespace patterns shared by the string heuristics.
struct TextPatterns {
    separator: Regex,
    multi_space: Regex,
}

impl TextPatterns {
    fn instance() -> Option<&'static Self> {
        static PATTERNS: OnceLock<Option<TextPatterns>> = OnceLock::new();
        PATTERNS
            .get_or_init(|| {
                let compiled = Regex::new(r"[^A-Za-z0-9]+").and_then(|separator| {
                    Ok(Self {
                        separator,
                        multi_space: Regex::new(r"\s{2,}")?,
                    })
                });
                match compiled {
                    Ok(patterns) => Some(patterns),
                    Err(e) => {
                        tracing::error!("Failed to compile text patterns: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }
}

/// Replaces runs of two or more whitespace characters with one space.
pub(crate) fn collapse_spaces(s: &str) -> String {
    match TextPatterns::instance() {
        Some(p) => p.multi_space.replace_all(s, " ").into_owned(),
        None => s.to_string(),
    }
}

fn has_multi_space(s: &str) -> bool {
    TextPatterns::instance().is_some_and(|p| p.multi_space.is_match(s))
}

/// A regex inferred from sample values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredPattern {
    /// Anchored pattern
    pub pattern: String,
    /// How it was derived
    pub description: String,
}

impl InferredPattern {
    fn new(pattern: String, description: &str) -> Self {
        Self {
            pattern,
            description: description.to_string(),
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_letters(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_upper(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn block_pattern(group: &[&str]) -> String {
    let first_len = group.first().map_or(0, |s| char_len(s));
    let uniform = group.iter().all(|s| char_len(s) == first_len);
    let class = if group.iter().all(|s| is_digits(s)) {
        r"\d"
    } else if group.iter().all(|s| is_upper(s)) {
        "[A-Z]"
    } else if group.iter().all(|s| is_letters(s)) {
        "[A-Za-z]"
    } else {
        return r"\w+".to_string();
    };
    if uniform {
        format!("{}{{{}}}", class, first_len)
    } else {
        format!("{}+", class)
    }
}

/// Infers an anchored regex from sample values.
///
/// Tries digit runs first, then equal-arity alphanumeric blocks joined by the
/// first sample's separators, then falls back to a length range. `None` only
/// for an empty sample.
pub fn infer_regex_from_samples<S: AsRef<str>>(samples: &[S]) -> Option<InferredPattern> {
    let samples: Vec<&str> = samples.iter().map(AsRef::as_ref).collect();
    let first = *samples.first()?;
    let lengths: Vec<usize> = samples.iter().map(|s| char_len(s)).collect();
    let min_len = lengths.iter().copied().min().unwrap_or(0);
    let max_len = lengths.iter().copied().max().unwrap_or(0);

    if samples.iter().all(|s| is_digits(s)) {
        return Some(if min_len == max_len {
            InferredPattern::new(format!(r"^\d{{{}}}$", min_len), "fixed-length digits")
        } else {
            InferredPattern::new(
                format!(r"^\d{{{},{}}}$", min_len, max_len),
                "variable-length digits",
            )
        });
    }

    if let Some(patterns) = TextPatterns::instance() {
        let blocks: Vec<Vec<&str>> = samples
            .iter()
            .map(|s| patterns.separator.split(s).collect())
            .collect();
        let arity = blocks[0].len();
        if arity > 1 && blocks.iter().all(|b| b.len() == arity) {
            let separators: Vec<&str> = patterns
                .separator
                .find_iter(first)
                .map(|m| m.as_str())
                .collect();
            let mut pattern = String::from("^");
            for g in 0..arity {
                if g > 0 {
                    match separators.get(g - 1) {
                        Some(sep) => pattern.push_str(&regex::escape(sep)),
                        None => pattern.push_str(r"[-_\s]?"),
                    }
                }
                let group: Vec<&str> = blocks.iter().map(|b| b[g]).collect();
                pattern.push_str(&block_pattern(&group));
            }
            pattern.push('$');
            return Some(InferredPattern::new(
                pattern,
                "alphanumeric blocks with separators",
            ));
        }
    }

    Some(InferredPattern::new(
        format!("^.{{{},{}}}$", min_len, max_len),
        "length range check",
    ))
}

#[derive(Debug, Default)]
struct StringStats {
    padded: usize,
    multi_spaces: usize,
    lower: usize,
    upper: usize,
    total: usize,
}

fn string_stats(values: &[&str]) -> StringStats {
    let mut stats = StringStats {
        total: values.len(),
        ..StringStats::default()
    };
    for s in values.iter().filter(|s| !s.is_empty()) {
        if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
            stats.padded += 1;
        }
        if has_multi_space(s) {
            stats.multi_spaces += 1;
        }
        let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && !has_upper {
            stats.lower += 1;
        } else if has_upper && !has_lower {
            stats.upper += 1;
        }
    }
    stats
}

fn formatting_transforms(column: &str, stats: &StringStats, case_pct: f64) -> Vec<TransformHint> {
    let mut transforms = Vec::new();
    if stats.padded > 0 {
        transforms.push(
            TransformHint::new(column, TransformKind::Trim, "Trim leading/trailing spaces")
                .with_example("\" ACME \" → \"ACME\""),
        );
    }
    if stats.multi_spaces > 0 {
        transforms.push(
            TransformHint::new(
                column,
                TransformKind::CollapseSpaces,
                "Replace multiple spaces with single",
            )
            .with_example("\"AC  ME\" → \"AC ME\""),
        );
    }
    let total = stats.total.max(1) as f64;
    if stats.upper as f64 / total * 100.0 >= case_pct {
        transforms.push(TransformHint::new(
            column,
            TransformKind::Upper,
            "Convert to UPPERCASE",
        ));
    } else if stats.lower as f64 / total * 100.0 >= case_pct {
        transforms.push(TransformHint::new(
            column,
            TransformKind::Lower,
            "Convert to lowercase",
        ));
    }
    transforms
}

/// Infers a value format for text columns and flags spacing/case issues.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringPatternHeuristic;

impl SuggestionHeuristic for StringPatternHeuristic {
    fn apply(&self, context: &ProfilingContext<'_>) -> Vec<Suggestion> {
        let config = context.config();
        let mut out = Vec::new();

        for (column, data_type) in context.columns() {
            if data_type != SemanticType::String {
                continue;
            }
            let values = context.dataset().non_missing_values(column);
            if values.len() < config.pattern_min_values {
                continue;
            }
            let sample: Vec<&str> = values
                .into_iter()
                .take(config.pattern_sample_size)
                .collect();
            let stats = string_stats(&sample);
            let transforms = formatting_transforms(column, &stats, config.case_dominance_pct);

            let top: Vec<String> = top_n(&sample, config.pattern_top_values)
                .into_iter()
                .map(|f| f.value)
                .collect();
            let inferred = infer_regex_from_samples(&top).filter(|p| match Regex::new(&p.pattern) {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!("Inferred pattern for [{}] is unusable: {}", column, e);
                    false
                }
            });

            if let Some(inferred) = inferred {
                let proposal = RuleProposal::new(
                    column,
                    data_type,
                    ConditionType::RegexMatch,
                    format!("Matches {}", inferred.pattern),
                )
                .with_param("pattern", inferred.pattern.clone());
                let coverage = context.coverage_for_proposal(&proposal);
                out.push(
                    Suggestion::new(
                        format!("regex-{}", column),
                        format!("Consistent format detected in [{}]: propose regex", column),
                        Severity::Medium,
                        QualityDimension::Validity,
                        vec![column.to_string()],
                    )
                    .with_rationale(format!(
                        "Inferred pattern from sample values ({}).",
                        inferred.description
                    ))
                    .with_coverage(coverage)
                    .with_rule(proposal)
                    .with_transforms(transforms),
                );
            } else if !transforms.is_empty() {
                let coverage =
                    context.coverage_with(column, |v| v.is_some_and(|s| !s.trim().is_empty()));
                out.push(
                    Suggestion::new(
                        format!("clean-{}", column),
                        format!(
                            "Formatting inconsistencies in [{}]: suggest normalization",
                            column
                        ),
                        Severity::Low,
                        QualityDimension::Consistency,
                        vec![column.to_string()],
                    )
                    .with_rationale("Spacing/case signs detected in values.")
                    .with_coverage(coverage)
                    .with_transforms(transforms),
                );
            }
        }
        out
    }

    fn name(&self) -> &str {
        "string-pattern"
    }

    fn description(&self) -> &str {
        "Infers value formats for text columns and flags spacing or case drift"
    }
}

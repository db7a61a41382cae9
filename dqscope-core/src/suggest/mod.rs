//! Heuristic rule suggestions.
//!
//! Each [`SuggestionHeuristic`] profiles the dataset's columns and proposes
//! rules, remediation transforms and tips. The [`SuggestionEngine`] runs every
//! registered heuristic, then orders the results by severity and by estimated
//! coverage of the rows currently failing.
//!
//! Suggestion generation never mutates anything. Turning a proposal into an
//! active rule is an explicit two-step: [`proposal_to_rule`] followed by
//! `Session::add_rule`.
//!
//! # Example
//! ```rust
//! use dqscope_core::engine::EvaluationOptions;
//! use dqscope_core::suggest::{ProfilingContext, SuggestionConfig, SuggestionEngine};
//! use dqscope_core::Dataset;
//!
//! let dataset = Dataset::from_json_str(r#"[{"a": "1"}, {"a": ""}]"#).unwrap();
//! let config = SuggestionConfig::default();
//! let context = ProfilingContext::new(&dataset, None, &config, &EvaluationOptions::default());
//! let report = SuggestionEngine::with_defaults().run(&context);
//! assert!(report.suggestions.iter().any(|s| s.id == "missing-a"));
//! ```

mod classes;
pub mod config;
mod missingness;
mod outliers;
mod patterns;
mod temporal;
mod uniqueness;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::{EvaluationOptions, EvaluationReport, rule_failures};
use crate::inference::{SemanticType, infer_column_type};
use crate::models::Dataset;
use crate::rules::{ConditionType, QualityDimension, Rule, is_suggestion_implemented, rules_contain};

pub use classes::ClassEnumerationHeuristic;
pub use config::{ConfigValidationError, SuggestionConfig};
pub use missingness::MissingnessHeuristic;
pub use outliers::OutlierHeuristic;
pub use patterns::{InferredPattern, StringPatternHeuristic, infer_regex_from_samples};
pub use temporal::TemporalWindowHeuristic;
pub use uniqueness::{UniquenessHeuristic, normalize_for_uniqueness};

/// How urgently a suggestion deserves attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic
    Low,
    /// Worth enforcing
    Medium,
    /// Likely data defect
    High,
    /// Reserved for blocking defects
    Critical,
}

impl Severity {
    /// Sort rank, higher first.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule a suggestion proposes, not yet part of the active set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleProposal {
    /// Target column
    pub column: String,
    /// Column type at the time of profiling
    pub data_type: SemanticType,
    /// Proposed condition
    pub condition_type: ConditionType,
    /// Proposed parameters
    pub params: Map<String, Value>,
    /// Human-readable description of the check
    pub preview_condition: String,
}

impl RuleProposal {
    /// Creates a proposal with no parameters.
    pub fn new(
        column: impl Into<String>,
        data_type: SemanticType,
        condition_type: ConditionType,
        preview_condition: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            data_type,
            condition_type,
            params: Map::new(),
            preview_condition: preview_condition.into(),
        }
    }

    /// Builder method to set one parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Converts a proposal into a rule. Pure; adding it is the caller's move.
pub fn proposal_to_rule(proposal: &RuleProposal) -> Rule {
    Rule {
        column: proposal.column.clone(),
        data_type: proposal.data_type,
        condition_type: proposal.condition_type,
        params: proposal.params.clone(),
    }
}

/// Kind of advisory data transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformKind {
    /// Fill or map values
    Map,
    /// Cap values to bounds
    Winsorize,
    /// Replace values with null
    Nullify,
    /// Log-transform
    Log,
    /// Review the source
    Investigate,
    /// Strip surrounding whitespace
    Trim,
    /// Collapse repeated spaces
    CollapseSpaces,
    /// Convert to upper case
    Upper,
    /// Convert to lower case
    Lower,
    /// Trim, collapse and lower-case
    Normalize,
    /// Keep one format
    Format,
    /// Remove duplicates
    Dedupe,
}

/// Advisory transformation; never applied automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformHint {
    /// Target column
    pub column: String,
    /// Transformation kind
    #[serde(rename = "type")]
    pub kind: TransformKind,
    /// What to do
    pub details: String,
    /// Before/after illustration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl TransformHint {
    /// Creates a hint without an example.
    pub fn new(column: impl Into<String>, kind: TransformKind, details: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind,
            details: details.into(),
            example: None,
        }
    }

    /// Builder method to attach an example.
    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }
}

/// One heuristic finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Stable id, e.g. `missing-<column>`; key for applied/dismissed state
    pub id: String,
    /// Headline
    pub title: String,
    /// Urgency
    pub severity: Severity,
    /// Dimension the finding concerns
    pub dimension: QualityDimension,
    /// Columns involved
    pub impacted_columns: Vec<String>,
    /// Evidence
    pub rationale: String,
    /// Share of currently failing rows the proposals would also catch
    pub estimated_coverage_pct: Option<f64>,
    /// Proposed rules
    pub proposed_rules: Vec<RuleProposal>,
    /// Advisory transformations
    pub transforms: Vec<TransformHint>,
    /// Free-text advice
    pub tips: Vec<String>,
}

impl Suggestion {
    /// Creates a suggestion over the given columns.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
        dimension: QualityDimension,
        impacted_columns: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            severity,
            dimension,
            impacted_columns,
            rationale: String::new(),
            estimated_coverage_pct: None,
            proposed_rules: Vec::new(),
            transforms: Vec::new(),
            tips: Vec::new(),
        }
    }

    /// Builder method to set the rationale.
    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Builder method to set the coverage estimate.
    #[must_use]
    pub fn with_coverage(mut self, pct: f64) -> Self {
        self.estimated_coverage_pct = Some(pct);
        self
    }

    /// Builder method to add a proposed rule.
    #[must_use]
    pub fn with_rule(mut self, proposal: RuleProposal) -> Self {
        self.proposed_rules.push(proposal);
        self
    }

    /// Builder method to set the transforms.
    #[must_use]
    pub fn with_transforms(mut self, transforms: Vec<TransformHint>) -> Self {
        self.transforms = transforms;
        self
    }

    /// Builder method to add a tip.
    #[must_use]
    pub fn with_tip(mut self, tip: impl Into<String>) -> Self {
        self.tips.push(tip.into());
        self
    }

    /// The proposals as rules.
    pub fn proposed_as_rules(&self) -> Vec<Rule> {
        self.proposed_rules.iter().map(proposal_to_rule).collect()
    }
}

/// Everything a heuristic may read.
///
/// Column types are inferred once per context; the failing rows come from
/// the last evaluation report, if any.
#[derive(Debug)]
pub struct ProfilingContext<'a> {
    dataset: &'a Dataset,
    report: Option<&'a EvaluationReport>,
    config: &'a SuggestionConfig,
    now_ms: f64,
    column_types: BTreeMap<&'a str, SemanticType>,
}

impl<'a> ProfilingContext<'a> {
    /// Creates a context; `report` is the last evaluation, if one ran.
    pub fn new(
        dataset: &'a Dataset,
        report: Option<&'a EvaluationReport>,
        config: &'a SuggestionConfig,
        options: &EvaluationOptions,
    ) -> Self {
        let column_types = dataset
            .headers()
            .iter()
            .map(|h| (h.as_str(), infer_column_type(dataset, h)))
            .collect();
        Self {
            dataset,
            report,
            config,
            now_ms: options.now_ms(),
            column_types,
        }
    }

    /// The dataset under analysis.
    pub const fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Heuristic thresholds.
    pub const fn config(&self) -> &'a SuggestionConfig {
        self.config
    }

    /// Reference instant in epoch milliseconds.
    pub const fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Headers with their inferred types, in header order.
    pub fn columns(&self) -> impl Iterator<Item = (&'a str, SemanticType)> + '_ {
        self.dataset
            .headers()
            .iter()
            .map(|h| (h.as_str(), self.column_type(h)))
    }

    /// Inferred type of a column.
    pub fn column_type(&self, column: &str) -> SemanticType {
        self.column_types
            .get(column)
            .copied()
            .unwrap_or_default()
    }

    /// Rows the last evaluation recorded as failing for `column`.
    pub fn failing_rows(&self, column: &str) -> BTreeSet<usize> {
        self.report
            .map(|r| r.column_failures(column))
            .unwrap_or_default()
    }

    /// Rows failing overall in the last evaluation.
    pub fn bad_row_count(&self) -> usize {
        self.report.map_or(0, EvaluationReport::bad_row_count)
    }

    /// Percentage of `column`'s failing rows on which `passes` is false.
    ///
    /// Zero when the column has no failing rows.
    pub fn coverage_with<F>(&self, column: &str, passes: F) -> f64
    where
        F: Fn(Option<&str>) -> bool,
    {
        let failing = self.failing_rows(column);
        if failing.is_empty() {
            return 0.0;
        }
        let captured = failing
            .iter()
            .filter(|&&row| !passes(self.dataset.value(row, column)))
            .count();
        captured as f64 / failing.len() as f64 * 100.0
    }

    /// Percentage of the rule column's failing rows the rule would also fail.
    ///
    /// Dataset-scoped rules are evaluated over the whole column first. A
    /// proposal that does not compile covers nothing.
    pub fn coverage_for_rule(&self, rule: &Rule) -> f64 {
        let failing = self.failing_rows(&rule.column);
        if failing.is_empty() {
            return 0.0;
        }
        let compiled = match rule.compile() {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("Proposal {} does not compile: {}", rule.label(), e);
                return 0.0;
            }
        };
        let caught = rule_failures(self.dataset, &compiled, self.now_ms);
        let captured = failing.intersection(&caught).count();
        captured as f64 / failing.len() as f64 * 100.0
    }

    /// [`Self::coverage_for_rule`] for a proposal.
    pub fn coverage_for_proposal(&self, proposal: &RuleProposal) -> f64 {
        self.coverage_for_rule(&proposal_to_rule(proposal))
    }
}

/// A column-profiling heuristic.
pub trait SuggestionHeuristic: Send + Sync {
    /// Profiles the dataset and returns zero or more suggestions.
    fn apply(&self, context: &ProfilingContext<'_>) -> Vec<Suggestion>;

    /// Short name for logs.
    fn name(&self) -> &str;

    /// What the heuristic looks for.
    fn description(&self) -> &str;
}

/// Output of one suggestion pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionReport {
    /// One-line summary
    pub summary: String,
    /// Suggestions, most urgent first
    pub suggestions: Vec<Suggestion>,
}

/// Runs heuristics and orders their findings.
pub struct SuggestionEngine {
    heuristics: Vec<Box<dyn SuggestionHeuristic>>,
}

impl fmt::Debug for SuggestionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggestionEngine")
            .field(
                "heuristics",
                &self.heuristics.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SuggestionEngine {
    /// Creates an engine with no heuristics.
    pub fn new() -> Self {
        Self {
            heuristics: Vec::new(),
        }
    }

    /// Creates an engine with the six built-in heuristics.
    pub fn with_defaults() -> Self {
        Self::new()
            .add_heuristic(Box::new(MissingnessHeuristic))
            .add_heuristic(Box::new(OutlierHeuristic))
            .add_heuristic(Box::new(StringPatternHeuristic))
            .add_heuristic(Box::new(ClassEnumerationHeuristic))
            .add_heuristic(Box::new(UniquenessHeuristic))
            .add_heuristic(Box::new(TemporalWindowHeuristic))
    }

    /// Registers a heuristic.
    #[must_use]
    pub fn add_heuristic(mut self, heuristic: Box<dyn SuggestionHeuristic>) -> Self {
        self.heuristics.push(heuristic);
        self
    }

    /// Names of the registered heuristics, in run order.
    pub fn heuristic_names(&self) -> Vec<&str> {
        self.heuristics.iter().map(|h| h.name()).collect()
    }

    /// Runs every heuristic and sorts by severity, then by coverage.
    ///
    /// Missing coverage sorts as zero; ties keep heuristic order.
    pub fn run(&self, context: &ProfilingContext<'_>) -> SuggestionReport {
        let mut suggestions = Vec::new();
        for heuristic in &self.heuristics {
            let found = heuristic.apply(context);
            tracing::debug!(
                "Heuristic {} produced {} suggestions",
                heuristic.name(),
                found.len()
            );
            suggestions.extend(found);
        }

        suggestions.sort_by(|a, b| {
            b.severity.rank().cmp(&a.severity.rank()).then_with(|| {
                let ca = a.estimated_coverage_pct.unwrap_or(0.0);
                let cb = b.estimated_coverage_pct.unwrap_or(0.0);
                cb.total_cmp(&ca)
            })
        });

        let summary = format!(
            "Local analysis: {} suggestions generated. Current bad rows: {}/{}.",
            suggestions.len(),
            context.bad_row_count(),
            context.dataset().row_count()
        );
        tracing::info!("{}", summary);
        SuggestionReport {
            summary,
            suggestions,
        }
    }
}

/// Suggestions still worth showing.
///
/// Hides applied or dismissed ids and suggestions whose every proposal is
/// already in `rules`.
pub fn visible_suggestions<'s>(
    suggestions: &'s [Suggestion],
    rules: &[Rule],
    applied: &HashSet<String>,
    dismissed: &HashSet<String>,
) -> Vec<&'s Suggestion> {
    suggestions
        .iter()
        .filter(|s| {
            !applied.contains(&s.id)
                && !dismissed.contains(&s.id)
                && !is_suggestion_implemented(rules, &s.proposed_as_rules())
        })
        .collect()
}

/// Proposals of `suggestion` not yet present in `rules`.
pub fn pending_proposals<'s>(suggestion: &'s Suggestion, rules: &[Rule]) -> Vec<&'s RuleProposal> {
    suggestion
        .proposed_rules
        .iter()
        .filter(|p| !rules_contain(rules, &proposal_to_rule(p)))
        .collect()
}

/// Formats a percentage with one decimal.
pub(crate) fn pct1(v: f64) -> String {
    format!("{:.1}", v)
}

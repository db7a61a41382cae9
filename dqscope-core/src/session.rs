//! Analysis session: the dataset, the active rules and the last evaluation.
//!
//! The session is the only owner of mutable analysis state. Any change to the
//! dataset or to the rule list drops the cached report, so the suggestion
//! engine never sees failing rows computed against stale inputs.
//!
//! # Example
//! ```rust
//! use dqscope_core::engine::EvaluationOptions;
//! use dqscope_core::rules::{ConditionType, Rule};
//! use dqscope_core::{Dataset, Session};
//!
//! let dataset = Dataset::from_json_str(r#"[{"a": "1"}, {"a": ""}]"#).unwrap();
//! let mut session = Session::new(dataset);
//! session.add_rule(Rule::new("a", ConditionType::NotEmpty)).unwrap();
//! let report = session.evaluate(&EvaluationOptions::default()).unwrap();
//! assert_eq!(report.bad_row_count(), 1);
//! ```

use crate::engine::{AnalysisSummary, EvaluationOptions, EvaluationReport, evaluate};
use crate::error::{DqError, Result};
use crate::models::Dataset;
use crate::rules::{Rule, rules_contain};
use crate::suggest::{
    ProfilingContext, RuleProposal, SuggestionConfig, SuggestionEngine, SuggestionReport,
    proposal_to_rule,
};

/// Mutable analysis state with a cached evaluation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    dataset: Dataset,
    rules: Vec<Rule>,
    config: SuggestionConfig,
    last_report: Option<EvaluationReport>,
}

impl Session {
    /// Creates a session over a dataset with no rules.
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            ..Self::default()
        }
    }

    /// Builder method to set the suggestion thresholds.
    #[must_use]
    pub fn with_config(mut self, config: SuggestionConfig) -> Self {
        self.config = config;
        self
    }

    /// The loaded dataset.
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The active rules in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Suggestion thresholds.
    pub const fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// The cached report, if the inputs have not changed since it was built.
    pub const fn last_report(&self) -> Option<&EvaluationReport> {
        self.last_report.as_ref()
    }

    fn invalidate(&mut self) {
        if self.last_report.take().is_some() {
            tracing::debug!("Cached evaluation invalidated");
        }
    }

    fn check_rule(&self, rule: &Rule) -> Result<()> {
        if !self.dataset.has_column(&rule.column) {
            return Err(DqError::unknown_column(&rule.column));
        }
        rule.compile().map(|_| ())
    }

    /// Replaces the dataset. Rules are kept.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.invalidate();
    }

    /// Replaces the whole rule list, as when loading a rule document.
    ///
    /// # Errors
    /// Fails without changing anything if any rule targets an unknown column
    /// or does not compile.
    pub fn set_rules(&mut self, rules: Vec<Rule>) -> Result<()> {
        for rule in &rules {
            self.check_rule(rule)?;
        }
        self.rules = rules;
        self.invalidate();
        Ok(())
    }

    /// Adds a rule and returns its index.
    ///
    /// # Errors
    /// Rejects rules on unknown columns and inert rules.
    pub fn add_rule(&mut self, rule: Rule) -> Result<usize> {
        self.check_rule(&rule)?;
        tracing::debug!("Adding rule {}", rule.label());
        self.rules.push(rule);
        self.invalidate();
        Ok(self.rules.len() - 1)
    }

    /// Replaces the rule at `index`, returning the previous one.
    ///
    /// # Errors
    /// Fails for an out-of-range index or a rule [`Self::add_rule`] would reject.
    pub fn replace_rule(&mut self, index: usize, rule: Rule) -> Result<Rule> {
        if index >= self.rules.len() {
            return Err(DqError::configuration(format!(
                "no rule at index {} ({} rules)",
                index,
                self.rules.len()
            )));
        }
        self.check_rule(&rule)?;
        let previous = std::mem::replace(&mut self.rules[index], rule);
        self.invalidate();
        Ok(previous)
    }

    /// Removes the rule at `index`.
    pub fn remove_rule(&mut self, index: usize) -> Option<Rule> {
        if index >= self.rules.len() {
            return None;
        }
        let removed = self.rules.remove(index);
        self.invalidate();
        Some(removed)
    }

    /// Inserts a copy of the rule at `index` right after it.
    pub fn duplicate_rule(&mut self, index: usize) -> Option<usize> {
        let copy = self.rules.get(index)?.clone();
        self.rules.insert(index + 1, copy);
        self.invalidate();
        Some(index + 1)
    }

    /// Converts a proposal and adds it unless an equal rule is already active.
    ///
    /// Returns `Ok(false)` when the rule was already present.
    ///
    /// # Errors
    /// Same as [`Self::add_rule`].
    pub fn apply_proposal(&mut self, proposal: &RuleProposal) -> Result<bool> {
        let rule = proposal_to_rule(proposal);
        if rules_contain(&self.rules, &rule) {
            return Ok(false);
        }
        self.add_rule(rule)?;
        Ok(true)
    }

    /// Runs every rule over every row and caches the report.
    ///
    /// Returns `None` (and clears the cache) for an empty dataset or rule list.
    pub fn evaluate(&mut self, options: &EvaluationOptions) -> Option<&EvaluationReport> {
        self.last_report = evaluate(&self.dataset, &self.rules, options);
        self.last_report.as_ref()
    }

    /// Headline findings for the cached report.
    pub fn summary(&self) -> Option<AnalysisSummary> {
        self.last_report
            .as_ref()
            .map(|report| AnalysisSummary::build(&self.dataset, &self.rules, report))
    }

    /// Runs the suggestion engine against the cached report.
    ///
    /// Without a cached report every coverage estimate is zero.
    pub fn suggestions(
        &self,
        engine: &SuggestionEngine,
        options: &EvaluationOptions,
    ) -> SuggestionReport {
        let context = ProfilingContext::new(
            &self.dataset,
            self.last_report.as_ref(),
            &self.config,
            options,
        );
        engine.run(&context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::SemanticType;
    use crate::rules::ConditionType;
    use serde_json::json;

    fn session() -> Session {
        let data = Dataset::from_json_str(
            &json!([
                {"a": "1", "b": "x"},
                {"a": "",  "b": "y"},
                {"a": "3", "b": "x"}
            ])
            .to_string(),
        )
        .unwrap();
        Session::new(data)
    }

    #[test]
    fn test_add_rule_rejects_inert_and_unknown_column() {
        let mut s = session();
        let inert = Rule::new("a", ConditionType::Range).with_param("min", 1);
        assert!(s.add_rule(inert).unwrap_err().is_inert_rule());
        assert!(matches!(
            s.add_rule(Rule::new("zzz", ConditionType::NotEmpty)),
            Err(DqError::UnknownColumn { .. })
        ));
        assert!(s.rules().is_empty());
        assert_eq!(s.add_rule(Rule::new("a", ConditionType::NotEmpty)).unwrap(), 0);
    }

    #[test]
    fn test_mutations_invalidate_cache() {
        let mut s = session();
        s.add_rule(Rule::new("a", ConditionType::NotEmpty)).unwrap();
        let options = EvaluationOptions::default();
        assert!(s.evaluate(&options).is_some());
        assert!(s.last_report().is_some());

        s.add_rule(Rule::new("b", ConditionType::Unique)).unwrap();
        assert!(s.last_report().is_none());

        s.evaluate(&options);
        s.duplicate_rule(0);
        assert!(s.last_report().is_none());

        s.evaluate(&options);
        s.remove_rule(1);
        assert!(s.last_report().is_none());

        s.evaluate(&options);
        let data = s.dataset().clone();
        s.set_dataset(data);
        assert!(s.last_report().is_none());
    }

    #[test]
    fn test_replace_and_duplicate() {
        let mut s = session();
        s.add_rule(Rule::new("a", ConditionType::NotEmpty)).unwrap();
        assert_eq!(s.duplicate_rule(0), Some(1));
        assert_eq!(s.rules().len(), 2);
        assert_eq!(s.duplicate_rule(7), None);

        let previous = s
            .replace_rule(1, Rule::new("b", ConditionType::Unique))
            .unwrap();
        assert_eq!(previous.condition_type, ConditionType::NotEmpty);
        assert_eq!(s.rules()[1].column, "b");
        assert!(s.replace_rule(9, Rule::new("b", ConditionType::Unique)).is_err());
        assert!(s.remove_rule(9).is_none());
    }

    #[test]
    fn test_set_rules_is_all_or_nothing() {
        let mut s = session();
        let rules = vec![
            Rule::new("a", ConditionType::NotEmpty),
            Rule::new("a", ConditionType::GreaterThan),
        ];
        assert!(s.set_rules(rules).is_err());
        assert!(s.rules().is_empty());
    }

    #[test]
    fn test_apply_proposal_skips_existing() {
        let mut s = session();
        let proposal = RuleProposal::new(
            "a",
            SemanticType::Numeric,
            ConditionType::NotEmpty,
            "Value must not be empty",
        );
        assert!(s.apply_proposal(&proposal).unwrap());
        assert!(!s.apply_proposal(&proposal).unwrap());
        assert_eq!(s.rules().len(), 1);
    }

    #[test]
    fn test_suggestions_use_cached_failures() {
        let mut s = session();
        s.add_rule(Rule::new("a", ConditionType::NotEmpty)).unwrap();
        let options = EvaluationOptions::default();
        s.evaluate(&options);
        let report = s.suggestions(&SuggestionEngine::with_defaults(), &options);
        assert!(report.summary.ends_with("Current bad rows: 1/3."));

        let summary = s.summary().unwrap();
        assert_eq!(summary.good_rows, 2);
    }

    #[test]
    fn test_evaluate_without_rules_clears_cache() {
        let mut s = session();
        assert!(s.evaluate(&EvaluationOptions::default()).is_none());
        assert!(s.summary().is_none());
    }
}

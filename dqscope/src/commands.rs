//! Command implementations.
//!
//! Each command loads its inputs, runs the core engines and returns a JSON
//! value for [`crate::output::render`].

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use dqscope_core::engine::SkippedRule;
use dqscope_core::suggest::visible_suggestions;
use dqscope_core::{
    AnalysisSummary, Dataset, EvaluationOptions, ResultsExport, Rule, Session, SuggestionConfig,
    SuggestionEngine, import_rules, profile_column, profile_dataset,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{CheckArgs, ProfileArgs, SuggestArgs, ValidateRulesArgs};

/// Report printed by `check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// Results payload
    pub results: ResultsExport,
    /// Headline findings
    pub summary: AnalysisSummary,
    /// Columns by failing row count
    pub top_columns: Vec<(String, usize)>,
    /// Rules by failing row count
    pub top_rules: Vec<(String, usize)>,
    /// Rules left out of the run
    pub skipped_rules: Vec<SkippedRule>,
}

fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let dataset = Dataset::from_json_file(path)
        .with_context(|| format!("Failed to load dataset {}", path.display()))?;
    info!(
        "Loaded {} rows x {} columns from {}",
        dataset.row_count(),
        dataset.headers().len(),
        path.display()
    );
    Ok(dataset)
}

fn load_rules(path: &Path) -> anyhow::Result<Vec<Rule>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule file {}", path.display()))?;
    import_rules(&json).with_context(|| format!("Invalid rule file {}", path.display()))
}

fn load_config(path: &Path) -> anyhow::Result<SuggestionConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: SuggestionConfig = serde_json::from_str(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn options(now: Option<DateTime<Utc>>) -> EvaluationOptions {
    now.map_or_else(EvaluationOptions::default, EvaluationOptions::at)
}

fn to_value<T: Serialize>(value: &T) -> anyhow::Result<Value> {
    serde_json::to_value(value).context("Failed to serialize report")
}

/// Evaluates a rule file against a dataset.
///
/// # Errors
/// Fails on unreadable inputs, rules on unknown columns, or an empty dataset.
pub fn check(args: &CheckArgs) -> anyhow::Result<Value> {
    let mut session = Session::new(load_dataset(&args.data)?);
    session.set_rules(load_rules(&args.rules)?)?;

    let Some(report) = session.evaluate(&options(args.now)).cloned() else {
        bail!("Nothing to evaluate: the dataset or the rule set is empty");
    };
    let Some(summary) = session.summary() else {
        bail!("Evaluation produced no report");
    };
    if report.bad_row_count() > 0 {
        warn!(
            "{} of {} rows fail at least one rule",
            report.bad_row_count(),
            report.total_rows
        );
    }

    to_value(&CheckReport {
        results: report.export(session.dataset(), session.rules()),
        summary,
        top_columns: report.top_columns(),
        top_rules: report.top_rules(),
        skipped_rules: report.skipped_rules.clone(),
    })
}

/// Runs the suggestion engine, hiding applied, dismissed and implemented
/// suggestions.
///
/// # Errors
/// Fails on unreadable inputs or an invalid config.
pub fn suggest(args: &SuggestArgs) -> anyhow::Result<Value> {
    let mut session = Session::new(load_dataset(&args.data)?);
    if let Some(config) = &args.config {
        session = session.with_config(load_config(config)?);
    }
    if let Some(rules) = &args.rules {
        session.set_rules(load_rules(rules)?)?;
    }

    let options = options(args.now);
    session.evaluate(&options);
    let mut report = session.suggestions(&SuggestionEngine::with_defaults(), &options);

    let applied: HashSet<String> = args.applied.iter().cloned().collect();
    let dismissed: HashSet<String> = args.dismissed.iter().cloned().collect();
    let visible: Vec<_> =
        visible_suggestions(&report.suggestions, session.rules(), &applied, &dismissed)
            .into_iter()
            .cloned()
            .collect();
    debug!(
        "{} of {} suggestions visible",
        visible.len(),
        report.suggestions.len()
    );
    report.suggestions = visible;
    to_value(&report)
}

/// Profiles one column or the whole dataset.
///
/// # Errors
/// Fails on an unreadable dataset or an unknown column.
pub fn profile(args: &ProfileArgs) -> anyhow::Result<Value> {
    let dataset = load_dataset(&args.data)?;
    match &args.column {
        Some(column) => {
            let Some(profile) = profile_column(&dataset, column, args.bins) else {
                bail!("Unknown column: {}", column);
            };
            to_value(&profile)
        }
        None => to_value(&profile_dataset(&dataset, args.bins)),
    }
}

/// Validates a rule file, optionally against a dataset's columns.
///
/// # Errors
/// Fails if the document is malformed, a rule is inert, or a rule targets a
/// column the dataset does not have.
pub fn validate_rules(args: &ValidateRulesArgs) -> anyhow::Result<Value> {
    let rules = load_rules(&args.rules)?;
    if let Some(data) = &args.data {
        let mut session = Session::new(load_dataset(data)?);
        session.set_rules(rules.clone())?;
    }
    let labels: Vec<String> = rules.iter().map(Rule::label).collect();
    Ok(serde_json::json!({
        "valid": true,
        "ruleCount": rules.len(),
        "rules": labels,
    }))
}

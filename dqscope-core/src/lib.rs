//! Core engines for dqscope.
//!
//! This crate evaluates declarative data-quality rules against an in-memory
//! tabular dataset and proposes new rules from column profiles. Everything
//! runs synchronously and in memory; nothing is persisted.
//!
//! # Layout
//! - [`inference`], [`temporal`] and [`stats`] are the leaf utilities
//! - [`rules`] compiles rule declarations into typed predicates
//! - [`engine`] runs rules and aggregates failing rows and scores
//! - [`suggest`] profiles columns and proposes rules with coverage estimates
//! - [`session`] owns the mutable state and caches the last evaluation
//! - [`profile`] builds chart-ready column profiles
//!
//! # Guarantees
//! - Evaluation never raises: unusable rules are skipped, bad values fail
//! - Results are deterministic for a fixed dataset, rule set and clock
//! - Suggestion generation never mutates the rule set

pub mod engine;
pub mod error;
pub mod inference;
pub mod logging;
pub mod models;
pub mod profile;
pub mod rules;
pub mod session;
pub mod stats;
pub mod suggest;
pub mod temporal;

// Re-export commonly used types
pub use engine::{AnalysisSummary, EvaluationOptions, EvaluationReport, ResultsExport, evaluate};
pub use error::{DqError, Result};
pub use inference::{SemanticType, infer_column_type, infer_type};
pub use models::{Dataset, is_missing};
pub use profile::{ColumnProfile, profile_column, profile_dataset};
pub use rules::{
    CompiledRule, ConditionType, QualityDimension, Rule, ValidationError, export_rules,
    import_rules,
};
pub use session::Session;
pub use suggest::{
    RuleProposal, Severity, Suggestion, SuggestionConfig, SuggestionEngine, SuggestionReport,
    proposal_to_rule,
};

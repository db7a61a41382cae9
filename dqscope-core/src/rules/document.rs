//! Rule-set documents: export, import and JSON Schema validation.
//!
//! A rule set is persisted as
//! `{ "format_version": "1.0", "rules": [ ... ] }`. Import also accepts a bare
//! JSON array of rules, the legacy form, and validates it the same way.
//!
//! # Example
//! ```rust
//! use dqscope_core::rules::{ConditionType, Rule, export_rules, import_rules};
//!
//! # fn example() -> dqscope_core::Result<()> {
//! let rules = vec![Rule::new("id", ConditionType::Unique)];
//! let json = export_rules(&rules)?;
//! assert_eq!(import_rules(&json)?, rules);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::sync::OnceLock;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{ConditionType, Rule};
use crate::error::{DqError, Result};

/// Rule document validation errors with field-level reporting
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Validation failed with specific field errors
    #[error("Schema validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// Unsupported format version detected
    #[error("Unsupported format version '{version}'. Supported versions: {supported:?}")]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

/// Format version written by [`export_rules`].
pub const RULES_FORMAT_VERSION: &str = "1.0";

const SUPPORTED_VERSIONS: &[&str] = &[RULES_FORMAT_VERSION];

/// Embedded JSON Schema for v1.0 rule documents
const RULES_SCHEMA_V1_0: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "dqscope Rule Set Format v1.0",
  "type": "object",
  "required": ["format_version", "rules"],
  "properties": {
    "format_version": {
      "type": "string",
      "pattern": "^1\\.0$"
    },
    "rules": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["column", "conditionType"],
        "properties": {
          "column": { "type": "string", "minLength": 1 },
          "dataType": {
            "enum": ["string", "numeric", "integer", "date", "time", "datetime", "boolean"]
          },
          "conditionType": { "type": "string", "minLength": 1 },
          "params": { "type": "object" }
        }
      }
    }
  }
}"#;

static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

#[derive(Serialize)]
struct RuleSetRef<'a> {
    format_version: &'a str,
    rules: &'a [Rule],
}

#[derive(Deserialize)]
struct RuleSet {
    rules: Vec<Rule>,
}

/// Compiles the embedded rule-set schema and caches it.
///
/// Safe to call more than once; later calls keep the first validator.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_rules_validator() -> std::result::Result<(), ValidationError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }
    let schema_json: Value =
        serde_json::from_str(RULES_SCHEMA_V1_0).map_err(|e| ValidationError::SchemaCompilation {
            message: format!("Failed to parse embedded schema: {}", e),
        })?;

    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    let _ = COMPILED_SCHEMA.set(compiled);
    Ok(())
}

/// Validates a rule-set document against the embedded schema.
///
/// The format version is checked first so an unknown version is reported as
/// such rather than as a pattern mismatch.
///
/// # Errors
/// Returns `UnsupportedVersion` or `ValidationFailed` with every schema error.
pub fn validate_rules_document(json_value: &Value) -> std::result::Result<(), ValidationError> {
    initialize_rules_validator()?;
    let schema = COMPILED_SCHEMA
        .get()
        .ok_or_else(|| ValidationError::SchemaCompilation {
            message: "Rule set validator not initialized".to_string(),
        })?;

    validate_format_version(json_value)?;

    let errors: Vec<String> = schema
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(ValidationError::ValidationFailed {
            error_count: errors.len(),
            errors,
        });
    }
    Ok(())
}

fn validate_format_version(json_value: &Value) -> std::result::Result<(), ValidationError> {
    let version = json_value
        .get("format_version")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec!["Missing required field 'format_version'".to_string()],
        })?;

    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(ValidationError::UnsupportedVersion {
            version: version.to_string(),
            supported: SUPPORTED_VERSIONS.iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok(())
}

/// Serializes rules as a pretty-printed v1.0 rule-set document.
///
/// # Errors
/// Returns `DqError::Serialization` if a parameter cannot be serialized.
pub fn export_rules(rules: &[Rule]) -> Result<String> {
    let document = RuleSetRef {
        format_version: RULES_FORMAT_VERSION,
        rules,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| DqError::serialization("Failed to serialize rule set", e))
}

/// Parses, validates and compiles a rule-set document or a bare rule array.
///
/// Every rule must compile, so an imported set never contains inert rules.
///
/// # Errors
/// - `DqError::Validation` for malformed JSON or schema violations
/// - `DqError::UnknownConditionType` for condition names outside the taxonomy
/// - `DqError::InertRule` for rules with missing or invalid parameters
pub fn import_rules(json: &str) -> Result<Vec<Rule>> {
    let parsed: Value = serde_json::from_str(json).map_err(ValidationError::from)?;
    let document = match parsed {
        Value::Array(rules) => {
            tracing::debug!("Importing legacy rule array with {} rules", rules.len());
            serde_json::json!({ "format_version": RULES_FORMAT_VERSION, "rules": rules })
        }
        other => other,
    };

    validate_rules_document(&document)?;

    // Report unknown condition types by name before generic deserialization
    if let Some(items) = document.get("rules").and_then(Value::as_array) {
        for name in items
            .iter()
            .filter_map(|item| item.get("conditionType").and_then(Value::as_str))
        {
            name.parse::<ConditionType>()?;
        }
    }

    let RuleSet { rules } = serde_json::from_value(document)
        .map_err(|e| DqError::serialization("Failed to deserialize rule set", e))?;

    for rule in &rules {
        rule.compile()?;
    }
    tracing::info!("Imported {} rules", rules.len());
    Ok(rules)
}

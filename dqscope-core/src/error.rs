//! Error types for dqscope operations.
//!
//! Errors are only raised for invalid construction (unknown condition types,
//! malformed datasets, unreadable rule documents). Evaluation itself recovers
//! locally: a predicate that cannot be evaluated fails the row, an inert rule
//! is skipped.

use thiserror::Error;

/// Main error type for dqscope operations.
#[derive(Debug, Error)]
pub enum DqError {
    /// A rule named a condition type outside the supported taxonomy
    #[error("Unknown condition type: {name}")]
    UnknownConditionType { name: String },

    /// Rule parameters are missing or invalid, so no predicate can be built
    #[error("Inert rule on column '{column}' ({condition_type}): {reason}")]
    InertRule {
        column: String,
        condition_type: String,
        reason: String,
    },

    /// Dataset shape is inconsistent with its headers
    #[error("Invalid dataset: {message}")]
    Dataset { message: String },

    /// A rule or suggestion referenced a column the dataset does not have
    #[error("Unknown column: {column}")]
    UnknownColumn { column: String },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Rule document failed schema validation
    #[error("Rule document validation failed: {source}")]
    Validation {
        #[from]
        source: crate::rules::ValidationError,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with DqError
pub type Result<T> = std::result::Result<T, DqError>;

impl DqError {
    /// Creates an unknown condition type error
    pub fn unknown_condition_type(name: impl Into<String>) -> Self {
        Self::UnknownConditionType { name: name.into() }
    }

    /// Creates an inert rule error
    pub fn inert_rule(
        column: impl Into<String>,
        condition_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InertRule {
            column: column.into(),
            condition_type: condition_type.into(),
            reason: reason.into(),
        }
    }

    /// Creates a dataset error
    pub fn dataset(message: impl Into<String>) -> Self {
        Self::Dataset {
            message: message.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates an unknown column error
    pub fn unknown_column(column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Returns true when the error means a rule could not be compiled.
    pub const fn is_inert_rule(&self) -> bool {
        matches!(self, Self::InertRule { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = DqError::configuration("Invalid threshold");
        assert!(error.to_string().contains("Invalid threshold"));

        let error = DqError::unknown_condition_type("between");
        assert_eq!(error.to_string(), "Unknown condition type: between");
    }

    #[test]
    fn test_inert_rule_message() {
        let error = DqError::inert_rule("age", "range", "missing 'max'");
        assert!(error.is_inert_rule());
        let message = error.to_string();
        assert!(message.contains("age"));
        assert!(message.contains("range"));
        assert!(message.contains("missing 'max'"));
    }

    #[test]
    fn test_dataset_error_is_not_inert() {
        assert!(!DqError::dataset("row 3 has unknown column").is_inert_rule());
    }
}

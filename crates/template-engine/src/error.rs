//! Error types for the template engine
//!
//! Rendering itself never fails. These errors surface at the authoring
//! boundary (validating rules and specs) and at the record store seam.

use shared_types::{FieldError, RuleOperator};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Rule for '{0}' depends on itself")]
    SelfReference(String),

    #[error("Rule for '{target}' uses {operator:?} but has no value")]
    MissingValue {
        target: String,
        operator: RuleOperator,
    },

    #[error("More than one rule targets '{0}'")]
    DuplicateTarget(String),

    #[error("Visibility rules form a cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// Failures reported by a record store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A selectable option for dropdown and radio fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl FieldOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// How a field is presented for input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    SingleSelect { options: Vec<FieldOption> },
    MultiOption { options: Vec<FieldOption> },
}

impl FieldKind {
    pub fn options(&self) -> &[FieldOption] {
        match self {
            FieldKind::Text => &[],
            FieldKind::SingleSelect { options } | FieldKind::MultiOption { options } => options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Field '{0}' is a choice field but has no options")]
    NoOptions(String),

    #[error("Field name must not be empty or contain '}}'")]
    InvalidName,
}

/// Display and input configuration for one placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    #[serde(default = "default_kind")]
    pub kind: FieldKind,
}

fn default_kind() -> FieldKind {
    FieldKind::Text
}

impl FieldSpec {
    /// Free-text field
    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: FieldKind::Text,
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check the structural invariants: a usable name, and at least one
    /// option for dropdown/radio kinds.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.name.is_empty() || self.name.contains('}') {
            return Err(FieldError::InvalidName);
        }
        match &self.kind {
            FieldKind::Text => Ok(()),
            FieldKind::SingleSelect { options } | FieldKind::MultiOption { options } => {
                if options.is_empty() {
                    Err(FieldError::NoOptions(self.name.clone()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Comparison applied by a visibility rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IsEmpty,
    IsNotEmpty,
}

impl RuleOperator {
    /// IsEmpty/IsNotEmpty ignore the rule value
    pub fn takes_value(&self) -> bool {
        !matches!(self, RuleOperator::IsEmpty | RuleOperator::IsNotEmpty)
    }
}

/// Makes `target_field` visible only while `depends_on` satisfies the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityRule {
    pub target_field: String,
    pub depends_on: String,
    pub operator: RuleOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl VisibilityRule {
    pub fn new(
        target_field: impl Into<String>,
        depends_on: impl Into<String>,
        operator: RuleOperator,
        value: Option<&str>,
    ) -> Self {
        Self {
            target_field: target_field.into(),
            depends_on: depends_on.into(),
            operator,
            value: value.map(str::to_string),
        }
    }
}

/// Current input state of a form. An absent key reads as the empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(HashMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `name`, or `""` when unset
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl PartialEq for FormValues {
    fn eq(&self, other: &Self) -> bool {
        let covers = |a: &Self, b: &Self| a.0.iter().all(|(k, v)| b.get(k) == v.as_str());
        covers(self, other) && covers(other, self)
    }
}

impl Eq for FormValues {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Everything the record store knows about one fact code's template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub factcode: String,
    pub template: String,
    #[serde(default)]
    pub field_specs: Vec<FieldSpec>,
    #[serde(default)]
    pub visibility_rules: Vec<VisibilityRule>,
    /// Field whose value keys the recent-entry history
    #[serde(default)]
    pub location_field: Option<String>,
}

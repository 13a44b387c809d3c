//! Conditional visibility of fields
//!
//! Each field may carry one rule making it depend on another field's current
//! value. `is_visible` is the plain single-level check. `resolve_visibility`
//! walks the dependency graph so that a field whose controlling field is
//! hidden is hidden too, and rejects cyclic rule sets.

use std::collections::{HashMap, HashSet};

use shared_types::{FormValues, RuleOperator, VisibilityRule};

use crate::error::RuleError;

/// Apply one rule to the current value of its `depends_on` field
pub fn rule_holds(rule: &VisibilityRule, current: &str) -> bool {
    let expected = rule.value.as_deref().unwrap_or("");
    match rule.operator {
        RuleOperator::Equals => current == expected,
        RuleOperator::NotEquals => current != expected,
        RuleOperator::Contains => current.contains(expected),
        RuleOperator::NotContains => !current.contains(expected),
        RuleOperator::IsEmpty => current.trim().is_empty(),
        RuleOperator::IsNotEmpty => !current.trim().is_empty(),
    }
}

fn rule_for<'a>(field: &str, rules: &'a [VisibilityRule]) -> Option<&'a VisibilityRule> {
    rules.iter().find(|r| r.target_field == field)
}

/// Single-level check: the controlling field is assumed visible.
/// A missing controlling value reads as the empty string.
pub fn is_visible(field: &str, values: &FormValues, rules: &[VisibilityRule]) -> bool {
    match rule_for(field, rules) {
        None => true,
        Some(rule) => rule_holds(rule, values.get(&rule.depends_on)),
    }
}

/// Resolved visibility of a set of fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    hidden: HashSet<String>,
}

impl Visibility {
    /// Fields without an entry are visible
    pub fn is_visible(&self, field: &str) -> bool {
        !self.hidden.contains(field)
    }

    pub fn hidden(&self) -> impl Iterator<Item = &str> {
        self.hidden.iter().map(String::as_str)
    }

    /// Single-level evaluation over `fields`, used when the rule graph cannot
    /// be resolved
    pub fn shallow<'a>(
        fields: impl IntoIterator<Item = &'a str>,
        values: &FormValues,
        rules: &[VisibilityRule],
    ) -> Self {
        let hidden = fields
            .into_iter()
            .filter(|f| !is_visible(f, values, rules))
            .map(str::to_string)
            .collect();
        Self { hidden }
    }
}

/// Evaluate visibility for `fields` (and every rule target) in dependency
/// order. A field is hidden when its rule fails or when the field it depends
/// on is itself hidden.
pub fn resolve_visibility<'a>(
    fields: impl IntoIterator<Item = &'a str>,
    values: &FormValues,
    rules: &[VisibilityRule],
) -> Result<Visibility, RuleError> {
    let mut resolver = Resolver {
        values,
        rules,
        done: HashMap::new(),
        stack: Vec::new(),
    };

    for field in fields {
        resolver.visit(field)?;
    }
    for rule in rules {
        resolver.visit(&rule.target_field)?;
    }

    let hidden = resolver
        .done
        .into_iter()
        .filter(|(_, visible)| !visible)
        .map(|(name, _)| name)
        .collect();
    Ok(Visibility { hidden })
}

struct Resolver<'r> {
    values: &'r FormValues,
    rules: &'r [VisibilityRule],
    done: HashMap<String, bool>,
    stack: Vec<String>,
}

impl<'r> Resolver<'r> {
    fn visit(&mut self, field: &str) -> Result<bool, RuleError> {
        if let Some(&visible) = self.done.get(field) {
            return Ok(visible);
        }
        let Some(rule) = rule_for(field, self.rules) else {
            self.done.insert(field.to_string(), true);
            return Ok(true);
        };
        if let Some(pos) = self.stack.iter().position(|f| f == field) {
            let mut cycle = self.stack[pos..].to_vec();
            cycle.push(field.to_string());
            return Err(RuleError::Cycle(cycle));
        }

        self.stack.push(field.to_string());
        let parent_visible = self.visit(&rule.depends_on)?;
        self.stack.pop();

        let visible = parent_visible && rule_holds(rule, self.values.get(&rule.depends_on));
        self.done.insert(field.to_string(), visible);
        Ok(visible)
    }
}

/// A validated rule set: at most one rule per target, no self references,
/// values present where the operator needs one, and no cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<VisibilityRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<VisibilityRule>) -> Result<Self, RuleError> {
        let mut targets = HashSet::new();
        for rule in &rules {
            if rule.target_field == rule.depends_on {
                return Err(RuleError::SelfReference(rule.target_field.clone()));
            }
            if rule.operator.takes_value() && rule.value.is_none() {
                return Err(RuleError::MissingValue {
                    target: rule.target_field.clone(),
                    operator: rule.operator,
                });
            }
            if !targets.insert(rule.target_field.as_str()) {
                return Err(RuleError::DuplicateTarget(rule.target_field.clone()));
            }
        }

        // Cycles do not depend on values, so any assignment exposes them
        resolve_visibility(std::iter::empty::<&str>(), &FormValues::new(), &rules)?;

        Ok(Self { rules })
    }

    pub fn resolve<'a>(
        &self,
        fields: impl IntoIterator<Item = &'a str>,
        values: &FormValues,
    ) -> Visibility {
        // Validated at construction, so resolution cannot hit a cycle
        resolve_visibility(fields, values, &self.rules).unwrap_or_default()
    }
}

//! One user's editing session on a template

use serde::Serialize;
use shared_types::{FieldSpec, FormValues, StopReason, TemplateDefinition, VisibilityRule};

use crate::error::EngineError;
use crate::fields::FieldCatalog;
use crate::reason::append_reason;
use crate::renderer::{render_with, RenderedDocument};
use crate::visibility::{RuleSet, Visibility};

/// An input field as the form should show it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInput {
    #[serde(flatten)]
    pub spec: FieldSpec,
    pub visible: bool,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ReportSession {
    definition: TemplateDefinition,
    catalog: FieldCatalog,
    rules: RuleSet,
    values: FormValues,
    /// Values most recently loaded from a saved entry
    prefill: Option<FormValues>,
    stop_reason: Option<StopReason>,
}

impl ReportSession {
    /// Start a session, validating the definition's specs and rules
    pub fn new(definition: TemplateDefinition) -> Result<Self, EngineError> {
        let catalog =
            FieldCatalog::from_specs(definition.field_specs.iter().cloned(), &definition.template)?;
        let rules = RuleSet::new(definition.visibility_rules.clone())?;
        Ok(Self {
            definition,
            catalog,
            rules,
            values: FormValues::new(),
            prefill: None,
            stop_reason: None,
        })
    }

    pub fn with_values(mut self, values: FormValues) -> Self {
        self.values = values;
        self
    }

    pub fn with_stop_reason(mut self, reason: Option<StopReason>) -> Self {
        self.stop_reason = reason;
        self
    }

    pub fn definition(&self) -> &TemplateDefinition {
        &self.definition
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn prefill(&self) -> Option<&FormValues> {
        self.prefill.as_ref()
    }

    pub fn set_value(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.set(field, value);
    }

    /// Load action: the given values replace the form wholesale
    pub fn replace_values(&mut self, values: FormValues) {
        self.prefill = Some(values.clone());
        self.values = values;
    }

    pub fn set_stop_reason(&mut self, reason: Option<StopReason>) {
        self.stop_reason = reason;
    }

    /// Apply an authoring edit. Specs given here replace earlier ones by
    /// name; every other spec is kept, including those of placeholders the
    /// new template no longer contains. Nothing changes when validation fails.
    pub fn revise(
        &mut self,
        template: impl Into<String>,
        specs: Vec<FieldSpec>,
        rules: Vec<VisibilityRule>,
        location_field: Option<String>,
    ) -> Result<(), EngineError> {
        specs.iter().try_for_each(FieldSpec::validate)?;
        let rule_set = RuleSet::new(rules.clone())?;

        for spec in specs {
            self.catalog.upsert_spec(spec)?;
        }
        self.rules = rule_set;
        self.definition.visibility_rules = rules;
        self.definition.location_field = location_field;
        self.edit_template(template);
        Ok(())
    }

    /// Swap in an edited template. Field configuration of placeholders that
    /// disappear is kept and comes back if they are re-added.
    pub fn edit_template(&mut self, template: impl Into<String>) {
        self.definition.template = template.into();
        self.catalog.reconcile(&self.definition.template);
        self.definition.field_specs = self.catalog.entries().iter().map(|e| e.spec.clone()).collect();
    }

    fn visibility(&self) -> Visibility {
        let names: Vec<&str> = self.catalog.active().map(|s| s.name.as_str()).collect();
        self.rules.resolve(names, &self.values)
    }

    /// Ordered, deduplicated input fields with their current visibility
    pub fn input_fields(&self) -> Vec<FieldInput> {
        let visibility = self.visibility();

        self.catalog
            .active()
            .map(|spec| FieldInput {
                visible: visibility.is_visible(&spec.name),
                value: self.values.get(&spec.name).to_string(),
                spec: spec.clone(),
            })
            .collect()
    }

    /// Current value of the template's location field, trimmed
    pub fn location_value(&self) -> Option<&str> {
        let field = self.definition.location_field.as_deref()?;
        let value = self.values.get(field).trim();
        (!value.is_empty()).then_some(value)
    }

    /// Current values minus those of hidden fields; the values that get saved
    pub fn visible_values(&self) -> FormValues {
        let visibility = self.visibility();
        self.values
            .iter()
            .filter(|(name, _)| visibility.is_visible(name))
            .collect()
    }

    /// The rendered template without the stop clause
    pub fn render_body(&self) -> RenderedDocument {
        render_with(
            &self.definition.template,
            &self.values,
            &self.catalog,
            &self.visibility(),
        )
    }

    /// The full document: rendered template plus the stop clause. This is
    /// what gets copied and saved.
    pub fn document(&self) -> RenderedDocument {
        let mut document = self.render_body();
        if let Some(reason) = &self.stop_reason {
            append_reason(&mut document, reason, &self.definition.factcode);
        }
        document
    }
}

//! Request and response bodies

use serde::{Deserialize, Serialize};
use shared_types::{FieldSpec, FormValues, SavedEntry, StopReason, TemplateDefinition, VisibilityRule};
use template_engine::{FieldInput, RenderedDocument, Segment, Upsert};

/// Body of `PUT /api/templates/:factcode`
#[derive(Debug, Clone, Deserialize)]
pub struct PutTemplateRequest {
    pub template: String,
    #[serde(default)]
    pub field_specs: Vec<FieldSpec>,
    #[serde(default)]
    pub visibility_rules: Vec<VisibilityRule>,
    #[serde(default)]
    pub location_field: Option<String>,
}

impl PutTemplateRequest {
    pub fn into_definition(self, factcode: String) -> TemplateDefinition {
        TemplateDefinition {
            factcode,
            template: self.template,
            field_specs: self.field_specs,
            visibility_rules: self.visibility_rules,
            location_field: self.location_field,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateResponse {
    pub definition: TemplateDefinition,
    /// Input fields in template order, with visibility for empty values
    pub fields: Vec<FieldInput>,
}

/// Current form state sent by the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub values: FormValues,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    pub text: String,
    pub segments: Vec<Segment>,
    pub unfilled_fields: Vec<String>,
    pub complete: bool,
    /// Fields with their visibility under the submitted values
    pub fields: Vec<FieldInput>,
}

impl RenderResponse {
    pub fn new(document: RenderedDocument, fields: Vec<FieldInput>) -> Self {
        let unfilled_fields = document
            .unfilled_fields()
            .into_iter()
            .map(str::to_string)
            .collect();
        let complete = document.is_complete();
        Self {
            text: document.text,
            segments: document.segments,
            unfilled_fields,
            complete,
            fields,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryList {
    pub entries: Vec<SavedEntry>,
    pub count: usize,
}

impl EntryList {
    pub fn new(entries: Vec<SavedEntry>) -> Self {
        let count = entries.len();
        Self { entries, count }
    }
}

/// Body of `POST /api/templates/:factcode/banner`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BannerRequest {
    #[serde(flatten)]
    pub form: RenderRequest,
    /// Values most recently loaded from a saved entry
    #[serde(default)]
    pub prefill: Option<FormValues>,
}

/// Body of `POST /api/templates/:factcode/entries`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub form: RenderRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    pub saved: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Upsert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse {
    pub entry_id: String,
    pub factcode: String,
    pub location_value: String,
    pub values: FormValues,
}

//! Field catalog: the authoritative spec for every placeholder of a template
//!
//! Specs survive template edits. When a placeholder disappears from the
//! template its spec is marked orphaned instead of being dropped, so adding the
//! placeholder back restores the earlier configuration. Only `remove_field`
//! deletes a spec.

use serde::{Deserialize, Serialize};
use shared_types::{FieldError, FieldSpec};
use tracing::debug;

use crate::placeholder::extract_fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// Placeholder is present in the current template
    Active,
    /// Placeholder was removed from the template; spec kept for restore
    Orphaned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub spec: FieldSpec,
    pub status: FieldStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldCatalog {
    /// Active entries in template order, then orphaned ones
    entries: Vec<CatalogEntry>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from authoring data and reconcile it against `template`
    pub fn from_specs(
        specs: impl IntoIterator<Item = FieldSpec>,
        template: &str,
    ) -> Result<Self, FieldError> {
        let mut catalog = Self::new();
        for spec in specs {
            catalog.upsert_spec(spec)?;
        }
        catalog.reconcile(template);
        Ok(catalog)
    }

    /// Align the catalog with the placeholders of `template` and return the
    /// active specs in first-appearance order. Unknown placeholders get a
    /// default text spec.
    pub fn reconcile(&mut self, template: &str) -> Vec<&FieldSpec> {
        let names = extract_fields(template);
        let mut previous = std::mem::take(&mut self.entries);
        let mut entries = Vec::with_capacity(names.len() + previous.len());

        for name in &names {
            let spec = match previous.iter().position(|e| &e.spec.name == name) {
                Some(idx) => previous.remove(idx).spec,
                None => {
                    debug!("Synthesizing default spec for field '{}'", name);
                    FieldSpec::text(name.clone(), derive_label(name))
                }
            };
            entries.push(CatalogEntry {
                spec,
                status: FieldStatus::Active,
            });
        }

        for mut entry in previous {
            entry.status = FieldStatus::Orphaned;
            entries.push(entry);
        }

        self.entries = entries;
        self.active().collect()
    }

    /// Insert or replace the spec for `spec.name`, keeping its status
    pub fn upsert_spec(&mut self, spec: FieldSpec) -> Result<(), FieldError> {
        spec.validate()?;
        match self.entries.iter_mut().find(|e| e.spec.name == spec.name) {
            Some(entry) => entry.spec = spec,
            None => self.entries.push(CatalogEntry {
                spec,
                status: FieldStatus::Orphaned,
            }),
        }
        Ok(())
    }

    /// Explicitly delete a field's configuration
    pub fn remove_field(&mut self, name: &str) -> Option<FieldSpec> {
        let idx = self.entries.iter().position(|e| e.spec.name == name)?;
        Some(self.entries.remove(idx).spec)
    }

    pub fn active(&self) -> impl Iterator<Item = &FieldSpec> {
        self.entries
            .iter()
            .filter(|e| e.status == FieldStatus::Active)
            .map(|e| &e.spec)
    }

    pub fn orphaned(&self) -> impl Iterator<Item = &FieldSpec> {
        self.entries
            .iter()
            .filter(|e| e.status == FieldStatus::Orphaned)
            .map(|e| &e.spec)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.entries
            .iter()
            .find(|e| e.spec.name == name)
            .map(|e| &e.spec)
    }

    /// Label for display, falling back to a derived one for unknown fields
    pub fn label_for(&self, name: &str) -> String {
        self.get(name)
            .map(|spec| spec.label.clone())
            .unwrap_or_else(|| derive_label(name))
    }
}

/// Human label from a field name: split on `_`, `-`, whitespace and
/// lower-to-upper case changes, then title-case each word.
pub fn derive_label(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

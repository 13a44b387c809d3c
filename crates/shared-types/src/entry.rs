//! Previously generated documents kept for reuse

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::FormValues;

/// A persisted generation: the document text plus the values that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntry {
    pub id: String,
    pub user_id: String,
    pub factcode: String,
    /// Trimmed, never empty
    pub location_value: String,
    pub form_values: FormValues,
    pub generated_text: String,
    pub created_at: DateTime<Utc>,
}

/// An entry that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub user_id: String,
    pub factcode: String,
    pub location_value: String,
    pub form_values: FormValues,
    pub generated_text: String,
}

impl NewEntry {
    /// Build an entry, trimming the location. Returns `None` when the
    /// location is blank, since such entries are never persisted.
    pub fn new(
        user_id: impl Into<String>,
        factcode: impl Into<String>,
        location_value: &str,
        form_values: FormValues,
        generated_text: impl Into<String>,
    ) -> Option<Self> {
        let location_value = location_value.trim();
        if location_value.is_empty() {
            return None;
        }
        Some(Self {
            user_id: user_id.into(),
            factcode: factcode.into(),
            location_value: location_value.to_string(),
            form_values,
            generated_text: generated_text.into(),
        })
    }

    /// Assign an id and creation time
    pub fn into_saved(self, now: DateTime<Utc>) -> SavedEntry {
        SavedEntry {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            factcode: self.factcode,
            location_value: self.location_value,
            form_values: self.form_values,
            generated_text: self.generated_text,
            created_at: now,
        }
    }
}

/// Partial update applied by `update_entry`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_values: Option<FormValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl EntryPatch {
    pub fn apply(&self, entry: &mut SavedEntry) {
        if let Some(values) = &self.form_values {
            entry.form_values = values.clone();
        }
        if let Some(location) = &self.location_value {
            let location = location.trim();
            if !location.is_empty() {
                entry.location_value = location.to_string();
            }
        }
        if let Some(at) = self.created_at {
            entry.created_at = at;
        }
    }
}

//! Record store seam
//!
//! Persistence of templates and saved entries lives outside the engine. Any
//! backend implementing [`RecordStore`] can serve the recommender and the API.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use shared_types::{EntryPatch, NewEntry, SavedEntry, TemplateDefinition};

use crate::error::StoreError;

/// Result of a content-keyed save
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "entry", rename_all = "snake_case")]
pub enum Upsert {
    Inserted(SavedEntry),
    /// An entry with identical text already existed and was refreshed
    Updated(SavedEntry),
}

impl Upsert {
    pub fn entry(&self) -> &SavedEntry {
        match self {
            Upsert::Inserted(entry) | Upsert::Updated(entry) => entry,
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_template(&self, factcode: &str) -> Result<TemplateDefinition, StoreError>;

    async fn put_template(&self, definition: TemplateDefinition) -> Result<(), StoreError>;

    /// Newest first, by `created_at`
    async fn list_recent_entries(
        &self,
        factcode: &str,
        limit: usize,
    ) -> Result<Vec<SavedEntry>, StoreError>;

    async fn get_entry(&self, id: &str) -> Result<Option<SavedEntry>, StoreError>;

    async fn find_entry_by_exact_text(
        &self,
        user_id: &str,
        factcode: &str,
        generated_text: &str,
    ) -> Result<Option<SavedEntry>, StoreError>;

    async fn save_entry(&self, entry: NewEntry) -> Result<SavedEntry, StoreError>;

    async fn update_entry(&self, id: &str, patch: EntryPatch) -> Result<SavedEntry, StoreError>;

    /// Move the entry to the front of the recent list
    async fn touch_timestamp(&self, id: &str) -> Result<(), StoreError>;

    async fn increment_access_counter(&self, factcode: &str) -> Result<(), StoreError>;

    /// Save keyed on `(user_id, factcode, generated_text)`.
    ///
    /// The default looks the entry up first and then writes, which is not
    /// atomic: two concurrent saves of the same text can both insert. Backends
    /// with a unique index should override this with a single upsert.
    async fn upsert_entry(&self, entry: NewEntry) -> Result<Upsert, StoreError> {
        let existing = self
            .find_entry_by_exact_text(&entry.user_id, &entry.factcode, &entry.generated_text)
            .await?;

        match existing {
            Some(found) => {
                let patch = EntryPatch {
                    form_values: Some(entry.form_values),
                    location_value: Some(entry.location_value),
                    created_at: Some(Utc::now()),
                };
                self.update_entry(&found.id, patch).await.map(Upsert::Updated)
            }
            None => self.save_entry(entry).await.map(Upsert::Inserted),
        }
    }
}

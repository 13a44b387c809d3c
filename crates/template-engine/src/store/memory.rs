//! In-memory record store, used by tests and for local runs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use shared_types::{EntryPatch, NewEntry, SavedEntry, TemplateDefinition};
use tokio::sync::RwLock;

use super::RecordStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Inner {
    templates: HashMap<String, TemplateDefinition>,
    entries: Vec<SavedEntry>,
    access_counts: HashMap<String, u64>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_templates(templates: impl IntoIterator<Item = TemplateDefinition>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write().await;
            for template in templates {
                inner.templates.insert(template.factcode.clone(), template);
            }
        }
        store
    }

    /// Insert an entry as-is, keeping its id and timestamp
    pub async fn insert_raw(&self, entry: SavedEntry) {
        self.inner.write().await.entries.push(entry);
    }

    pub async fn access_count(&self, factcode: &str) -> u64 {
        self.inner
            .read()
            .await
            .access_counts
            .get(factcode)
            .copied()
            .unwrap_or(0)
    }

    pub async fn entry_count(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_template(&self, factcode: &str) -> Result<TemplateDefinition, StoreError> {
        self.inner
            .read()
            .await
            .templates
            .get(factcode)
            .cloned()
            .ok_or_else(|| StoreError::TemplateNotFound(factcode.to_string()))
    }

    async fn put_template(&self, definition: TemplateDefinition) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .templates
            .insert(definition.factcode.clone(), definition);
        Ok(())
    }

    async fn list_recent_entries(
        &self,
        factcode: &str,
        limit: usize,
    ) -> Result<Vec<SavedEntry>, StoreError> {
        let inner = self.inner.read().await;
        // Latest insert first so the stable sort breaks timestamp ties by recency
        let mut entries: Vec<SavedEntry> = inner
            .entries
            .iter()
            .rev()
            .filter(|e| e.factcode == factcode)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn get_entry(&self, id: &str) -> Result<Option<SavedEntry>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn find_entry_by_exact_text(
        &self,
        user_id: &str,
        factcode: &str,
        generated_text: &str,
    ) -> Result<Option<SavedEntry>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .entries
            .iter()
            .find(|e| {
                e.user_id == user_id && e.factcode == factcode && e.generated_text == generated_text
            })
            .cloned())
    }

    async fn save_entry(&self, entry: NewEntry) -> Result<SavedEntry, StoreError> {
        let saved = entry.into_saved(Utc::now());
        self.inner.write().await.entries.push(saved.clone());
        Ok(saved)
    }

    async fn update_entry(&self, id: &str, patch: EntryPatch) -> Result<SavedEntry, StoreError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::EntryNotFound(id.to_string()))?;
        patch.apply(entry);
        Ok(entry.clone())
    }

    async fn touch_timestamp(&self, id: &str) -> Result<(), StoreError> {
        let patch = EntryPatch {
            created_at: Some(Utc::now()),
            ..Default::default()
        };
        self.update_entry(id, patch).await.map(|_| ())
    }

    async fn increment_access_counter(&self, factcode: &str) -> Result<(), StoreError> {
        *self
            .inner
            .write()
            .await
            .access_counts
            .entry(factcode.to_string())
            .or_default() += 1;
        Ok(())
    }
}

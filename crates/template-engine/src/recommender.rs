//! Recent-entry recommendations
//!
//! Prior generations for a fact code are fetched newest first, reduced to one
//! entry per location, and offered back for reuse: a short list of top picks,
//! type-ahead suggestions for the location field, and a banner that skips
//! whatever the user is already looking at.
//!
//! Store failures never reach the caller, except when looking up an entry by
//! id. Fetches fall back to the last snapshot, saves and timestamp touches are
//! dropped with a warning.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared_types::{FormValues, NewEntry, SavedEntry, TemplateDefinition};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::{RecordStore, Upsert};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// How many recent rows to fetch before deduplication
    pub recent_limit: usize,
    pub top_picks: usize,
    pub suggestion_limit: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            recent_limit: 100,
            top_picks: 3,
            suggestion_limit: 8,
        }
    }
}

/// Keep the first entry per trimmed location. Input must be newest first, so
/// the kept entry is the most recent one for its location.
pub fn dedupe_by_location(entries: Vec<SavedEntry>) -> Vec<SavedEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let key = entry.location_value.trim();
            !key.is_empty() && seen.insert(key.to_string())
        })
        .collect()
}

/// Deduplicated history for one fact code
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub top_picks: Vec<SavedEntry>,
    pub entries: Vec<SavedEntry>,
}

impl Recommendations {
    pub fn from_recent(recent: Vec<SavedEntry>, top_picks: usize) -> Self {
        let entries = dedupe_by_location(recent);
        let top_picks = entries.iter().take(top_picks).cloned().collect();
        Self { top_picks, entries }
    }

    fn is_top_pick(&self, entry: &SavedEntry) -> bool {
        self.top_picks.iter().any(|top| top.id == entry.id)
    }

    /// Entries whose location contains `typed` (case-insensitive), excluding
    /// the top picks. Blank input yields nothing.
    pub fn suggestions(&self, typed: &str, limit: usize) -> Vec<&SavedEntry> {
        let needle = typed.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| !self.is_top_pick(entry))
            .filter(|entry| entry.location_value.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }

    /// Top picks worth showing in the "recent" banner: anything matching the
    /// active prefill or the currently rendered document is left out.
    pub fn banner(&self, active_prefill: Option<&FormValues>, rendered_text: &str) -> Vec<&SavedEntry> {
        self.top_picks
            .iter()
            .filter(|entry| active_prefill != Some(&entry.form_values))
            .filter(|entry| entry.generated_text != rendered_text)
            .collect()
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    /// Latest ticket handed out for this fact code
    issued: u64,
    current: Recommendations,
}

/// Fetches, caches and saves recent entries through a [`RecordStore`]
pub struct Recommender {
    store: Arc<dyn RecordStore>,
    config: RecommenderConfig,
    snapshots: Mutex<HashMap<String, Snapshot>>,
}

impl Recommender {
    pub fn new(store: Arc<dyn RecordStore>, config: RecommenderConfig) -> Self {
        Self {
            store,
            config,
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Last published recommendations for `factcode`
    pub async fn current(&self, factcode: &str) -> Recommendations {
        self.snapshots
            .lock()
            .await
            .get(factcode)
            .map(|s| s.current.clone())
            .unwrap_or_default()
    }

    /// Fetch and publish fresh recommendations. Only the most recently
    /// issued refresh for a fact code may publish; an older one finishing
    /// late is dropped. On store failure the last snapshot is returned.
    pub async fn refresh(&self, factcode: &str) -> Recommendations {
        let ticket = {
            let mut snapshots = self.snapshots.lock().await;
            let snapshot = snapshots.entry(factcode.to_string()).or_default();
            snapshot.issued += 1;
            snapshot.issued
        };

        let fetched = self
            .store
            .list_recent_entries(factcode, self.config.recent_limit)
            .await;

        let mut snapshots = self.snapshots.lock().await;
        let snapshot = snapshots.entry(factcode.to_string()).or_default();
        match fetched {
            Ok(recent) => {
                let recommendations = Recommendations::from_recent(recent, self.config.top_picks);
                if snapshot.issued == ticket {
                    debug!(
                        "Published {} recent entries for {}",
                        recommendations.entries.len(),
                        factcode
                    );
                    snapshot.current = recommendations.clone();
                } else {
                    debug!("Dropping stale recommendations for {} (ticket {})", factcode, ticket);
                }
                recommendations
            }
            Err(e) => {
                warn!("Failed to fetch recent entries for {}: {}", factcode, e);
                snapshot.current.clone()
            }
        }
    }

    /// Load a recommended entry: its values replace the active form wholesale.
    /// The timestamp touch is best effort.
    pub async fn load(&self, entry: &SavedEntry) -> FormValues {
        if let Err(e) = self.store.touch_timestamp(&entry.id).await {
            warn!("Failed to touch entry {}: {}", entry.id, e);
        }
        info!("Loaded entry {} ({})", entry.id, entry.location_value);
        entry.form_values.clone()
    }

    /// Look up an entry by id and load it. Only the lookup can fail; the
    /// timestamp touch stays best effort.
    pub async fn load_by_id(&self, id: &str) -> Result<Option<SavedEntry>, StoreError> {
        let Some(entry) = self.store.get_entry(id).await? else {
            return Ok(None);
        };
        self.load(&entry).await;
        Ok(Some(entry))
    }

    /// Persist a generation, refreshing an existing entry with identical text
    /// instead of inserting a duplicate. Nothing is saved when the location
    /// field is unset or blank, or when the store fails.
    pub async fn save(
        &self,
        user_id: &str,
        definition: &TemplateDefinition,
        values: &FormValues,
        generated_text: &str,
    ) -> Option<Upsert> {
        let Some(location_field) = definition.location_field.as_deref() else {
            debug!("Template {} has no location field, not saving", definition.factcode);
            return None;
        };
        let entry = NewEntry::new(
            user_id,
            definition.factcode.clone(),
            values.get(location_field),
            values.clone(),
            generated_text,
        )?;

        match self.store.upsert_entry(entry).await {
            Ok(outcome) => {
                let verb = match &outcome {
                    Upsert::Inserted(_) => "Saved",
                    Upsert::Updated(_) => "Refreshed",
                };
                info!("{} entry {} for {}", verb, outcome.entry().id, definition.factcode);
                Some(outcome)
            }
            Err(e) => {
                warn!("Failed to save entry for {}: {}", definition.factcode, e);
                None
            }
        }
    }

    /// Fire-and-forget access telemetry
    pub fn record_access(&self, factcode: &str) {
        let store = Arc::clone(&self.store);
        let factcode = factcode.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.increment_access_counter(&factcode).await {
                debug!("Access counter for {} not updated: {}", factcode, e);
            }
        });
    }
}

//! Application state for the report API

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use template_engine::{RecordStore, Recommender, RecommenderConfig, ReportSession};

use crate::db::SqliteStore;
use crate::error::ApiError;

pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub recommender: Recommender,
}

impl AppState {
    pub async fn new(database_url: Option<String>, config: RecommenderConfig) -> Result<Self> {
        // Get database path from args/env or use default
        let database_url = database_url.unwrap_or_else(|| {
            let data_dir = dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("report-api");
            std::fs::create_dir_all(&data_dir).ok();
            format!("sqlite:{}/reports.db?mode=rwc", data_dir.display())
        });

        let store = Arc::new(SqliteStore::connect(&database_url).await?);
        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: Arc<SqliteStore>, config: RecommenderConfig) -> Self {
        let shared: Arc<dyn RecordStore> = store.clone();
        Self {
            store,
            recommender: Recommender::new(shared, config),
        }
    }

    /// Fetch a template and open an editing session on it
    pub async fn session(&self, factcode: &str) -> Result<ReportSession, ApiError> {
        let definition = self.store.get_template(factcode).await?;
        Ok(ReportSession::new(definition)?)
    }
}

/// Get platform-specific data directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }
}

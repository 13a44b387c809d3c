//! SQLite-backed record store

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use shared_types::{EntryPatch, FormValues, NewEntry, SavedEntry, TemplateDefinition};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use template_engine::{RecordStore, StoreError, Upsert};

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Saved entry as stored in the database
#[derive(Debug, Clone, FromRow)]
struct DbEntry {
    id: String,
    user_id: String,
    factcode: String,
    location_value: String,
    form_values_json: String,
    generated_text: String,
    created_at_ms: i64,
}

impl DbEntry {
    fn into_entry(self) -> Result<SavedEntry, StoreError> {
        let form_values: FormValues = serde_json::from_str(&self.form_values_json)?;
        let created_at = Utc
            .timestamp_millis_opt(self.created_at_ms)
            .single()
            .ok_or_else(|| {
                StoreError::Backend(format!("Invalid timestamp on entry {}", self.id))
            })?;
        Ok(SavedEntry {
            id: self.id,
            user_id: self.user_id,
            factcode: self.factcode,
            location_value: self.location_value,
            form_values,
            generated_text: self.generated_text,
            created_at,
        })
    }
}

const ENTRY_COLUMNS: &str =
    "id, user_id, factcode, location_value, form_values_json, generated_text, created_at_ms";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        // In-memory databases are per connection
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS templates (
                factcode TEXT PRIMARY KEY,
                definition_json TEXT NOT NULL,
                access_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                factcode TEXT NOT NULL,
                location_value TEXT NOT NULL CHECK (length(trim(location_value)) > 0),
                form_values_json TEXT NOT NULL,
                generated_text TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        // Identical text for the same user and fact code is one row
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_content
            ON entries(user_id, factcode, generated_text)
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_entries_recent ON entries(factcode, created_at_ms DESC)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    #[cfg(test)]
    pub async fn access_count(&self, factcode: &str) -> Result<i64, StoreError> {
        let count: Option<(i64,)> =
            sqlx::query_as("SELECT access_count FROM templates WHERE factcode = ?")
                .bind(factcode)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        Ok(count.map(|(c,)| c).unwrap_or(0))
    }

    async fn fetch_entry(&self, id: &str) -> Result<Option<SavedEntry>, StoreError> {
        let row: Option<DbEntry> =
            sqlx::query_as(&format!("SELECT {} FROM entries WHERE id = ?", ENTRY_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        row.map(DbEntry::into_entry).transpose()
    }
}

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_template(&self, factcode: &str) -> Result<TemplateDefinition, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT definition_json FROM templates WHERE factcode = ?")
                .bind(factcode)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        let (json,) = row.ok_or_else(|| StoreError::TemplateNotFound(factcode.to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn put_template(&self, definition: TemplateDefinition) -> Result<(), StoreError> {
        let json = serde_json::to_string(&definition)?;
        sqlx::query(
            r#"
            INSERT INTO templates (factcode, definition_json) VALUES (?, ?)
            ON CONFLICT(factcode) DO UPDATE SET definition_json = excluded.definition_json
            "#,
        )
        .bind(&definition.factcode)
        .bind(&json)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn list_recent_entries(
        &self,
        factcode: &str,
        limit: usize,
    ) -> Result<Vec<SavedEntry>, StoreError> {
        let rows: Vec<DbEntry> = sqlx::query_as(&format!(
            "SELECT {} FROM entries WHERE factcode = ? ORDER BY created_at_ms DESC, rowid DESC LIMIT ?",
            ENTRY_COLUMNS
        ))
        .bind(factcode)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(DbEntry::into_entry).collect()
    }

    async fn get_entry(&self, id: &str) -> Result<Option<SavedEntry>, StoreError> {
        self.fetch_entry(id).await
    }

    async fn find_entry_by_exact_text(
        &self,
        user_id: &str,
        factcode: &str,
        generated_text: &str,
    ) -> Result<Option<SavedEntry>, StoreError> {
        let row: Option<DbEntry> = sqlx::query_as(&format!(
            "SELECT {} FROM entries WHERE user_id = ? AND factcode = ? AND generated_text = ?",
            ENTRY_COLUMNS
        ))
        .bind(user_id)
        .bind(factcode)
        .bind(generated_text)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.map(DbEntry::into_entry).transpose()
    }

    async fn save_entry(&self, entry: NewEntry) -> Result<SavedEntry, StoreError> {
        let saved = entry.into_saved(Utc::now());
        sqlx::query(&format!(
            "INSERT INTO entries ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
            ENTRY_COLUMNS
        ))
        .bind(&saved.id)
        .bind(&saved.user_id)
        .bind(&saved.factcode)
        .bind(&saved.location_value)
        .bind(serde_json::to_string(&saved.form_values)?)
        .bind(&saved.generated_text)
        .bind(millis(saved.created_at))
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(saved)
    }

    async fn update_entry(&self, id: &str, patch: EntryPatch) -> Result<SavedEntry, StoreError> {
        let mut entry = self
            .fetch_entry(id)
            .await?
            .ok_or_else(|| StoreError::EntryNotFound(id.to_string()))?;
        patch.apply(&mut entry);

        sqlx::query(
            r#"
            UPDATE entries
            SET location_value = ?, form_values_json = ?, created_at_ms = ?
            WHERE id = ?
            "#,
        )
        .bind(&entry.location_value)
        .bind(serde_json::to_string(&entry.form_values)?)
        .bind(millis(entry.created_at))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(entry)
    }

    async fn touch_timestamp(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE entries SET created_at_ms = ? WHERE id = ?")
            .bind(millis(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::EntryNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn increment_access_counter(&self, factcode: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE templates SET access_count = access_count + 1 WHERE factcode = ?")
            .bind(factcode)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    /// Single statement keyed on the unique content index, so concurrent
    /// saves of the same text cannot produce two rows
    async fn upsert_entry(&self, entry: NewEntry) -> Result<Upsert, StoreError> {
        let candidate = entry.into_saved(Utc::now());
        let row: DbEntry = sqlx::query_as(&format!(
            r#"
            INSERT INTO entries ({cols}) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, factcode, generated_text) DO UPDATE SET
                location_value = excluded.location_value,
                form_values_json = excluded.form_values_json,
                created_at_ms = excluded.created_at_ms
            RETURNING {cols}
            "#,
            cols = ENTRY_COLUMNS
        ))
        .bind(&candidate.id)
        .bind(&candidate.user_id)
        .bind(&candidate.factcode)
        .bind(&candidate.location_value)
        .bind(serde_json::to_string(&candidate.form_values)?)
        .bind(&candidate.generated_text)
        .bind(millis(candidate.created_at))
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        let inserted = row.id == candidate.id;
        let entry = row.into_entry()?;
        Ok(if inserted {
            Upsert::Inserted(entry)
        } else {
            Upsert::Updated(entry)
        })
    }
}

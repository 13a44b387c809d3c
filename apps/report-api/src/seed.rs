//! Template seeding from a TOML file
//!
//! ```toml
//! [[templates]]
//! factcode = "R397b"
//! template = "Ik zag {naam} rijden op de {locatie}."
//! location_field = "locatie"
//!
//! [[templates.field_specs]]
//! name = "naam"
//! label = "Naam bestuurder"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use shared_types::TemplateDefinition;
use template_engine::{RecordStore, ReportSession};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    templates: Vec<TemplateDefinition>,
}

/// Parse and validate every template in a seed document
pub fn parse_seed(text: &str) -> Result<Vec<TemplateDefinition>> {
    let seed: SeedFile = toml::from_str(text).context("Invalid seed file")?;
    for definition in &seed.templates {
        ReportSession::new(definition.clone())
            .with_context(|| format!("Invalid template {}", definition.factcode))?;
    }
    Ok(seed.templates)
}

/// Store every template from `path`, replacing existing definitions
pub async fn load_seed_file(path: &Path, store: &dyn RecordStore) -> Result<usize> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let templates = parse_seed(&text)?;
    let count = templates.len();

    for definition in templates {
        store.put_template(definition).await?;
    }

    info!("Seeded {} template(s) from {}", count, path.display());
    Ok(count)
}

//! Store file persistence.
//!
//! The knowledge store is kept on disk as one JSON document:
//!
//! ```json
//! { "columns": ["Question", "Response"], "records": [ { "Question": "...", "Response": "..." } ] }
//! ```
//!
//! Records keep their column order. Writes go to a sibling temp file first
//! and are renamed into place.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use query_desk_core::{InMemoryStore, Record, RecordStore};

use crate::config::Config;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreFile {
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub records: Vec<Record>,
}

/// An empty store with the configured fixed columns, if any.
pub fn empty_store(config: &Config) -> InMemoryStore {
    match &config.store.columns {
        Some(columns) => InMemoryStore::with_columns(columns.clone()),
        None => InMemoryStore::new(),
    }
}

/// Load the store named by `store.path`. A missing file is an empty store.
pub fn load_store(config: &Config) -> Result<InMemoryStore> {
    let path = &config.store.path;
    if !path.exists() {
        tracing::warn!(path = %path.display(), "store file not found; starting with an empty store");
        return Ok(empty_store(config));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store file: {}", path.display()))?;
    let file: StoreFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse store file: {}", path.display()))?;

    // A configured schema is fixed. A schema saved in the file stays
    // inferred unless the file holds no records to infer it from.
    let store = match (&config.store.columns, &file.columns) {
        (Some(columns), _) => InMemoryStore::with_columns(columns.clone()),
        (None, Some(columns)) if file.records.is_empty() => {
            InMemoryStore::with_columns(columns.clone())
        }
        (None, _) => InMemoryStore::new(),
    };
    let count = file.records.len();
    store
        .reload(file.records)
        .with_context(|| format!("Store file has inconsistent records: {}", path.display()))?;
    tracing::debug!(path = %path.display(), records = count, "store loaded");
    Ok(store)
}

/// Write every record of `store` to `path`.
pub fn save_store(path: &Path, store: &dyn RecordStore) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = StoreFile {
        columns: store.columns(),
        records: store.all(),
    };
    let json = serde_json::to_string_pretty(&file)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("Failed to write store file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace store file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), records = file.records.len(), "store saved");
    Ok(())
}

/// `qdesk init`: create the store file if it does not exist yet.
pub fn run_init(config: &Config) -> Result<()> {
    let path = &config.store.path;
    if path.exists() {
        println!("Store already exists: {}", path.display());
        return Ok(());
    }
    save_store(path, &empty_store(config))?;
    println!("Store initialized: {}", path.display());
    Ok(())
}

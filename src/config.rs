//! TOML configuration for the `qdesk` CLI.
//!
//! ```toml
//! [store]
//! path = "./data/store.json"
//! # Optional fixed schema; omit to take columns from the first record.
//! columns = ["User", "Mood", "Interaction", "Response", "Recommendation"]
//!
//! [matching]
//! key_column = "Mood"
//! response_column = "Response"
//!
//! [replies]
//! greeting = "Hello! How can I help you today?"
//! fallback = "I'm here to help! How can I assist you?"
//!
//! [ingest]
//! include_globs = ["**/*.csv", "**/*.pdf", "**/*.docx"]
//! ```
//!
//! Every section except `[store]` may be omitted.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use query_desk_core::matcher::{DEFAULT_GREETING_REPLY, DEFAULT_KEY_COLUMN};
use query_desk_core::MatchConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub replies: RepliesConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Set to `""` to always compare against the whole record.
    #[serde(default = "default_key_column")]
    pub key_column: String,
    #[serde(default = "default_response_column")]
    pub response_column: String,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            key_column: default_key_column(),
            response_column: default_response_column(),
        }
    }
}

fn default_key_column() -> String {
    DEFAULT_KEY_COLUMN.to_string()
}
fn default_response_column() -> String {
    "Response".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepliesConfig {
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default = "default_empty_store")]
    pub empty_store: String,
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            fallback: default_fallback(),
            empty_store: default_empty_store(),
        }
    }
}

fn default_greeting() -> String {
    DEFAULT_GREETING_REPLY.to_string()
}
fn default_fallback() -> String {
    "I'm here to help! How can I assist you?".to_string()
}
fn default_empty_store() -> String {
    "No data has been loaded yet. Ingest a document or dataset first.".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    [
        "**/*.txt", "**/*.md", "**/*.pdf", "**/*.docx", "**/*.csv", "**/*.json",
    ]
    .iter()
    .map(|g| g.to_string())
    .collect()
}

impl Config {
    /// Defaults with the store under `./data`, for commands run without a
    /// config file.
    pub fn minimal() -> Self {
        Self {
            store: StoreConfig {
                path: PathBuf::from("./data/store.json"),
                columns: None,
            },
            matching: MatchingConfig::default(),
            replies: RepliesConfig::default(),
            ingest: IngestConfig::default(),
        }
    }

    pub fn match_config(&self) -> MatchConfig {
        let key = self.matching.key_column.trim();
        MatchConfig {
            key_column: (!key.is_empty()).then(|| key.to_string()),
            greeting_reply: self.replies.greeting.clone(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.store.path.as_os_str().is_empty() {
        bail!("store.path must not be empty");
    }

    if let Some(columns) = &config.store.columns {
        if columns.is_empty() {
            bail!("store.columns must list at least one column when set");
        }
        let mut seen = std::collections::HashSet::new();
        for c in columns {
            if c.trim().is_empty() {
                bail!("store.columns must not contain empty names");
            }
            if !seen.insert(c.as_str()) {
                bail!("store.columns contains duplicate column '{}'", c);
            }
        }
    }

    if config.matching.response_column.trim().is_empty() {
        bail!("matching.response_column must not be empty");
    }

    if config.ingest.include_globs.is_empty() {
        bail!("ingest.include_globs must list at least one pattern");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("qdesk.toml");
        std::fs::write(&path, body).unwrap();
        (dir, path)
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let (_dir, path) = write_config("[store]\npath = \"store.json\"\n");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.matching.key_column, "Question");
        assert_eq!(cfg.matching.response_column, "Response");
        assert_eq!(cfg.replies.fallback, "I'm here to help! How can I assist you?");
        assert!(cfg.ingest.include_globs.contains(&"**/*.csv".to_string()));
        assert_eq!(cfg.store.columns, None);
    }

    #[test]
    fn empty_key_column_means_whole_record() {
        let (_dir, path) =
            write_config("[store]\npath = \"s.json\"\n[matching]\nkey_column = \"\"\n");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.match_config().key_column, None);
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let (_dir, path) =
            write_config("[store]\npath = \"s.json\"\ncolumns = [\"Mood\", \"Mood\"]\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn missing_store_section_is_an_error() {
        let (_dir, path) = write_config("[matching]\nkey_column = \"Mood\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/qdesk.toml")).is_err());
    }
}

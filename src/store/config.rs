//! Store Configuration
//!
//! Database location, mapping file name and conflict policy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::errors::{StoreError, StoreResult};

/// Property key for the server URL
pub const PROP_URL: &str = "url";
/// Property key for the database name
pub const PROP_DATABASE: &str = "database";
/// Property key for the mapping file
pub const PROP_MAPPING_FILE: &str = "mapping.file";
/// Property key for the conflict recovery count
pub const PROP_CONFLICT_RETRIES: &str = "conflict.retries";

/// Document store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Server URL (default: "http://localhost:5984")
    #[serde(default = "default_url")]
    pub url: String,

    /// Database holding the documents
    pub database: String,

    /// Mapping file name (default: "couchmap-mapping.xml")
    #[serde(default = "default_mapping_file")]
    pub mapping_file: String,

    /// Fetch-delete-retry cycles allowed per commit (default: 1)
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
}

fn default_url() -> String {
    "http://localhost:5984".to_string()
}

fn default_mapping_file() -> String {
    "couchmap-mapping.xml".to_string()
}

fn default_conflict_retries() -> u32 {
    1
}

impl StoreConfig {
    /// Config for `database` with every other setting at its default
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            url: default_url(),
            database: database.into(),
            mapping_file: default_mapping_file(),
            conflict_retries: default_conflict_retries(),
        }
    }

    /// Set the conflict recovery count
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    /// Build from flat key/value properties.
    ///
    /// `database` is required; every other key is optional.
    pub fn from_properties(props: &HashMap<String, String>) -> StoreResult<Self> {
        let database = props
            .get(PROP_DATABASE)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| StoreError::Config(format!("missing property '{}'", PROP_DATABASE)))?;

        let mut config = Self::new(database.as_str());
        if let Some(url) = props.get(PROP_URL) {
            config.url = url.clone();
        }
        if let Some(mapping) = props.get(PROP_MAPPING_FILE) {
            config.mapping_file = mapping.clone();
        }
        if let Some(retries) = props.get(PROP_CONFLICT_RETRIES) {
            config.conflict_retries = retries.parse().map_err(|_| {
                StoreError::Config(format!(
                    "property '{}' is not a count: {}",
                    PROP_CONFLICT_RETRIES, retries
                ))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            StoreError::Config(format!("invalid config '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> StoreResult<()> {
        if self.database.is_empty() {
            return Err(StoreError::Config("database name is empty".into()));
        }
        if self.url.is_empty() {
            return Err(StoreError::Config("url is empty".into()));
        }
        Ok(())
    }
}

//! Journal configuration
//!
//! Settings are read from a YAML file. Every field is optional:
//!
//! ```yaml
//! key_prefix: "persistence:journal"
//! store: rocksdb
//! configuration_string: "/var/lib/orders/journal"
//! database: 0
//! call_timeout_ms: 30000
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::adapter::store::StoreType;

pub const DEFAULT_KEY_PREFIX: &str = "persistence:journal";

/// Settings for the journal and its backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalSettings {
    /// Prefix of every key written by the journal
    pub key_prefix:           String,
    /// Backing store implementation
    pub store:                StoreType,
    /// Where the store lives; empty means the platform data directory
    pub configuration_string: String,
    /// Logical database index inside the store
    pub database:             u32,
    /// Timeout for calls made through the journal actor
    pub call_timeout_ms:      u64
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            key_prefix:           DEFAULT_KEY_PREFIX.to_string(),
            store:                StoreType::InMemory,
            configuration_string: String::new(),
            database:             0,
            call_timeout_ms:      30_000
        }
    }
}

impl JournalSettings {
    /// Parse settings from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: JournalSettings = serde_yaml::from_str(content).context("Failed to parse journal settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would produce ambiguous keys
    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() {
            anyhow::bail!("key_prefix must not be empty");
        }
        if self.call_timeout_ms == 0 {
            anyhow::bail!("call_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Resolve the on-disk location of the store
    pub fn store_path(&self) -> Result<PathBuf> {
        if self.configuration_string.is_empty() {
            get_data_dir().map(|dir| dir.join("journal"))
        } else {
            Ok(PathBuf::from(&self.configuration_string))
        }
    }
}

/// Get the project directories for cross-platform path resolution
pub fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "ordered-journal").context("Failed to determine project directories")
}

/// Get the data directory path
pub fn get_data_dir() -> Result<PathBuf> {
    let project_dirs = get_project_dirs()?;
    Ok(project_dirs.data_dir().to_path_buf())
}

/// Load settings from a YAML file, falling back to defaults when it doesn't exist
pub fn load_settings(path: &Path) -> Result<JournalSettings> {
    if !path.exists() {
        return Ok(JournalSettings::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read journal settings: {}", path.display()))?;

    JournalSettings::from_yaml(&content).with_context(|| format!("Invalid journal settings: {}", path.display()))
}

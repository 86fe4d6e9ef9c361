//! User configuration for the favorites store and the poem generator.
//!
//! Every section uses `#[serde(default)]`, so a partial (or absent) file
//! yields the built-in defaults for whatever it leaves out.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use shihua_core::CorruptPolicy;
use std::path::{Path, PathBuf};

use crate::paths;

/// Storage key the mobile app persisted favorites under.
pub const DEFAULT_COLLECTION_KEY: &str = "savedPoems";
pub const DEFAULT_AUTHOR: &str = "AI 创作";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShihuaConfig {
    pub storage: StorageConfig,
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the key-value files. None = XDG state dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Key holding the whole favorites collection.
    pub collection_key: String,
    pub corrupt_policy: CorruptPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
            corrupt_policy: CorruptPolicy::default(),
        }
    }
}

impl StorageConfig {
    /// Resolved favorites directory.
    pub fn favorites_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(paths::default_favorites_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Attribution stamped on generated poems.
    pub author: String,
    /// Artificial latency before a poem is returned.
    pub simulated_delay_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            simulated_delay_ms: 0,
        }
    }
}

impl ShihuaConfig {
    /// Load from `path`, or from the default location when `path` is None.
    ///
    /// A missing file yields defaults; a file that exists but cannot be read
    /// or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match paths::default_config_path() {
                Some(p) => p,
                None => {
                    tracing::debug!("no config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let key = &self.storage.collection_key;
        if key.trim().is_empty() {
            bail!("storage.collection_key must not be empty");
        }
        if key.contains('/') || key.contains('\\') || key.contains("..") || key.starts_with('.') {
            bail!(
                "storage.collection_key must not start with '.' or contain path separators or '..': '{key}'"
            );
        }
        if key.contains(".corrupt") {
            bail!("storage.collection_key must not contain '.corrupt', which names backups: '{key}'");
        }
        if self.generator.author.trim().is_empty() {
            bail!("generator.author must not be empty");
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

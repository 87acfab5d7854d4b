use std::path::{Path, PathBuf};

use anyhow::Context;
use cask_blob::BlobConfig;
use serde::{Deserialize, Serialize};

/// Name of the settings file inside a store directory.
pub const CONFIG_FILE: &str = "cask.toml";

/// Subdirectory holding chunk files.
pub const CHUNK_DIR: &str = "chunks";

/// Per-store settings, read from `cask.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaskConfig {
    /// Type recorded in manifests of new blobs.
    pub blob_type: String,
    pub blob: BlobConfig,
}

impl Default for CaskConfig {
    fn default() -> Self {
        Self {
            blob_type: "file".into(),
            blob: BlobConfig::default(),
        }
    }
}

impl CaskConfig {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let path = Self::path(dir);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("{} is not a cask store (run `cask init`)", dir.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, dir: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(Self::path(dir), text)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.blob_type.is_empty(), "blob_type must not be empty");
        self.blob.validate()?;
        Ok(())
    }
}

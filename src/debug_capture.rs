use std::path::{Path, PathBuf};

use crate::config::DebugConfig;
use crate::models::TrackedItem;
use crate::Result;

/// Writes raw page markup next to the process when an item is confirmed sold out.
#[derive(Debug, Clone)]
pub struct DebugCapture {
    directory: PathBuf,
}

impl DebugCapture {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn from_config(config: &DebugConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(&config.directory))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, item: &TrackedItem) -> PathBuf {
        self.directory.join(item.debug_file_name())
    }

    /// Overwrites the item's debug file with `html` and returns its path.
    pub async fn save(&self, item: &TrackedItem, html: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.path_for(item);
        tokio::fs::write(&path, html).await?;
        tracing::debug!("{}: saved page markup to {}", item.name, path.display());
        Ok(path)
    }
}

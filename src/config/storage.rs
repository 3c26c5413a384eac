//! Session storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ConfigValidationError;

/// Where live sessions are kept
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; sessions are lost on restart
    #[default]
    Memory,
    /// One YAML file per user under `directory`
    File,
}

/// Session storage settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Required for the file backend
    pub directory: Option<PathBuf>,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.backend == StorageBackend::File && self.directory.is_none() {
            return Err(ConfigValidationError::MissingRequired("STORAGE__DIRECTORY"));
        }
        Ok(())
    }
}

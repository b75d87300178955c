//! Centralized path management for Banter storage locations.

use std::path::PathBuf;

use banter_core::error::{BanterError, Result};

const APP_DIR: &str = "banter";

/// Resolves the on-disk locations the infrastructure layer writes to.
///
/// Tests pass an explicit root (usually a `tempfile::TempDir`) so nothing
/// touches the real user directories.
#[derive(Debug, Clone)]
pub struct BanterPaths {
    root: Option<PathBuf>,
}

impl BanterPaths {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Base directory for the embedded document store.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| BanterError::storage("cannot determine the local data directory"))
    }

    /// Path of the flat preferences file (remember-me login record).
    pub fn prefs_file(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.join("prefs.toml"));
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("prefs.toml"))
            .ok_or_else(|| BanterError::storage("cannot determine the config directory"))
    }
}

impl Default for BanterPaths {
    fn default() -> Self {
        Self::new(None)
    }
}

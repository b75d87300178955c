//! Flat local preferences file.
//!
//! Holds the small bits of state that live outside the document store, at
//! the moment only the remember-me login record. Writes go through a
//! temporary file and an atomic rename.

use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;

use banter_core::error::Result;
use banter_core::user::AuthRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Prefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth: Option<AuthRecord>,
}

/// Handle to the preferences file.
#[derive(Debug, Clone)]
pub struct PrefsFile {
    path: PathBuf,
}

impl PrefsFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Reads the remembered login, if any. A missing file is not an error.
    pub async fn load_auth(&self) -> Result<Option<AuthRecord>> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => {
                let prefs: Prefs = toml::from_str(&raw)?;
                Ok(prefs.auth)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the remembered login.
    pub async fn save_auth(&self, auth: &AuthRecord) -> Result<()> {
        self.write(Prefs {
            auth: Some(auth.clone()),
        })
        .await
    }

    /// Clears the remembered login.
    pub async fn clear_auth(&self) -> Result<()> {
        self.write(Prefs::default()).await
    }

    async fn write(&self, prefs: Prefs) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let raw = toml::to_string_pretty(&prefs)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, raw.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

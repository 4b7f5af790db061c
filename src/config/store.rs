use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::model::Credential;
use crate::domain::ports::CredentialStore;
use crate::utils::error::{Result, VsacError};

/// Credential store over a JSON token file.
///
/// The record is read and rewritten in full on every mutation; there is no
/// partial update. Missing or unreadable files surface as
/// `CredentialUnavailable` so the caller can point the user at `init`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self) -> VsacError {
        VsacError::CredentialUnavailable {
            path: self.path.display().to_string(),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Credential> {
        let data = fs::read(&self.path).map_err(|e| {
            tracing::debug!("credential file read failed: {e}");
            self.unavailable()
        })?;
        serde_json::from_slice(&data).map_err(|e| {
            tracing::debug!("credential file parse failed: {e}");
            self.unavailable()
        })
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        let json = serde_json::to_string_pretty(credential)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Reads value set ids from the `Oid` column of a CSV load list.
pub fn load_id_list(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let oid_index = headers.iter().position(|h| h == "Oid").ok_or_else(|| {
        VsacError::InvalidConfigValue {
            field: "input".to_string(),
            value: path.display().to_string(),
            reason: "load list has no 'Oid' column".to_string(),
        }
    })?;

    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(oid) = record.get(oid_index) {
            let oid = oid.trim();
            if !oid.is_empty() {
                ids.push(oid.to_string());
            }
        }
    }

    tracing::debug!("loaded {} value set ids from {}", ids.len(), path.display());
    Ok(ids)
}

//! Identity store adapters
//!
//! - [`MemoryIdentityStore`] keeps the identity for the life of the process
//! - [`FileIdentityStore`] persists it as a small JSON document
//! - [`open_identity_store`] picks a backend from configuration, including
//!   the keyring-backed store from `zonesync-remote`

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use zonesync_core::config::{IdentityConfig, IdentityStoreKind};
use zonesync_core::domain::newtypes::RemoteIdentity;
use zonesync_core::ports::{IIdentityStore, IDENTITY_KEY};
use zonesync_remote::KeyringIdentityStore;

/// Builds the identity store selected in configuration
pub fn open_identity_store(config: &IdentityConfig) -> Arc<dyn IIdentityStore> {
    match config.store {
        IdentityStoreKind::Keyring => Arc::new(KeyringIdentityStore::new()),
        IdentityStoreKind::File => Arc::new(FileIdentityStore::new(config.file_path.clone())),
        IdentityStoreKind::Memory => Arc::new(MemoryIdentityStore::new()),
    }
}

// ============================================================================
// MemoryIdentityStore
// ============================================================================

/// Process-local identity store
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identity: Mutex<Option<RemoteIdentity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `identity`
    pub fn with_identity(identity: RemoteIdentity) -> Self {
        Self {
            identity: Mutex::new(Some(identity)),
        }
    }
}

impl IIdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Option<RemoteIdentity>> {
        Ok(self
            .identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, identity: &RemoteIdentity) -> Result<()> {
        *self.identity.lock().unwrap_or_else(PoisonError::into_inner) = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.identity.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// ============================================================================
// FileIdentityStore
// ============================================================================

/// On-disk document: `{"remote-identity": "<identity>"}`
#[derive(Debug, Serialize, Deserialize)]
struct IdentityDocument {
    #[serde(rename = "remote-identity")]
    identity: RemoteIdentity,
}

/// Identity store backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IIdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<RemoteIdentity>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No identity file");
                return Ok(None);
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!(
                    "Failed to read identity file {}",
                    self.path.display()
                )))
            }
        };

        let document: IdentityDocument = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt identity file {}", self.path.display()))?;
        debug!(path = %self.path.display(), key = IDENTITY_KEY, "Loaded identity from file");
        Ok(Some(document.identity))
    }

    fn store(&self, identity: &RemoteIdentity) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create identity directory {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&IdentityDocument {
            identity: identity.clone(),
        })
        .context("Failed to serialize identity")?;

        // Written to a sibling file and renamed into place
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write identity file {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move identity file to {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Stored identity in file");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Cleared identity file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context(format!(
                "Failed to remove identity file {}",
                self.path.display()
            ))),
        }
    }
}

//! System keyring persistence for the resolved remote identity
//!
//! Uses the `keyring` crate to keep the identity in the OS credential store
//! (e.g., GNOME Keyring, KDE Wallet, macOS Keychain) under the service
//! `zonesync` and the well-known key [`IDENTITY_KEY`].

use anyhow::{Context, Result};
use tracing::{debug, info};

use zonesync_core::domain::newtypes::RemoteIdentity;
use zonesync_core::ports::{IIdentityStore, IDENTITY_KEY};

/// Keyring service name for the identity entry
const KEYRING_SERVICE: &str = "zonesync";

/// Stores the remote identity in the system keyring
#[derive(Debug, Clone)]
pub struct KeyringIdentityStore {
    service: String,
}

impl KeyringIdentityStore {
    /// Creates a store using the default `zonesync` service name
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    /// Creates a store under a custom service name (one per app container)
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Service name entries are stored under
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, IDENTITY_KEY).context("Failed to create keyring entry")
    }
}

impl Default for KeyringIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IIdentityStore for KeyringIdentityStore {
    fn load(&self) -> Result<Option<RemoteIdentity>> {
        match self.entry()?.get_password() {
            Ok(value) => {
                let identity = RemoteIdentity::new(value)
                    .context("Keyring holds an invalid remote identity")?;
                debug!(service = %self.service, "Loaded remote identity from keyring");
                Ok(Some(identity))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, "No remote identity in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn store(&self, identity: &RemoteIdentity) -> Result<()> {
        self.entry()?
            .set_password(identity.as_str())
            .context("Failed to store remote identity in keyring")?;
        debug!(service = %self.service, "Stored remote identity in keyring");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                info!(service = %self.service, "Cleared remote identity from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, "No remote identity to clear");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}

//! Remote identity resolution
//!
//! The identity namespaces the sync zone per account. It is resolved over the
//! network once per install and read from the [`IIdentityStore`] afterwards.

use std::sync::Arc;

use tracing::{debug, info};

use zonesync_core::domain::newtypes::RemoteIdentity;
use zonesync_core::ports::{IIdentityStore, IRemoteStore};

use crate::error::SyncError;

/// Resolves and caches the durable identity of the current remote account
pub struct IdentityResolver {
    remote: Arc<dyn IRemoteStore>,
    store: Arc<dyn IIdentityStore>,
}

impl IdentityResolver {
    pub fn new(remote: Arc<dyn IRemoteStore>, store: Arc<dyn IIdentityStore>) -> Self {
        Self { remote, store }
    }

    /// Returns the cached identity, or resolves and persists it
    ///
    /// A cached identity is returned without any network call. Otherwise a
    /// single identity request is made; its failure is returned unmodified and
    /// nothing is persisted.
    pub async fn resolve(&self) -> Result<RemoteIdentity, SyncError> {
        if let Some(identity) = self.store.load().map_err(SyncError::IdentityStore)? {
            debug!("Using cached remote identity");
            return Ok(identity);
        }

        debug!("No cached remote identity, asking the remote store");
        let identity = self.remote.fetch_current_identity().await?;

        self.store
            .store(&identity)
            .map_err(SyncError::IdentityStore)?;
        info!("Resolved and cached remote identity");

        Ok(identity)
    }

    /// Forgets the cached identity so the next [`resolve`](Self::resolve) asks the remote
    pub fn clear(&self) -> Result<(), SyncError> {
        self.store.clear().map_err(SyncError::IdentityStore)
    }
}

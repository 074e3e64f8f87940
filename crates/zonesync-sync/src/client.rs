//! Sync client facade
//!
//! [`SyncClient`] sequences the engine components for the host application:
//!
//! 1. [`initialise`](SyncClient::initialise) resolves the account identity
//!    and provisions the sync zone
//! 2. [`fetch_record_changes`](SyncClient::fetch_record_changes),
//!    [`upload`](SyncClient::upload) and [`remove`](SyncClient::remove)
//!    operate on that zone
//!
//! The client holds the resolved identity and zone id and nothing else.
//! Records and change tokens belong to the host. `initialise` must not run
//! concurrently with itself; the host serializes it.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use zonesync_core::config::Config;
use zonesync_core::domain::newtypes::{ChangeToken, RecordId, RemoteIdentity, ZoneId};
use zonesync_core::domain::{ChangeCollection, Record};
use zonesync_core::ports::{IIdentityStore, IRemoteStore};
use zonesync_remote::{HttpRemoteStore, RemoteClient};

use crate::error::SyncError;
use crate::fetcher::{ChangeFetcher, FetchEvent};
use crate::identity::IdentityResolver;
use crate::identity_store::open_identity_store;
use crate::mutation::MutationClient;
use crate::provisioner::{ProvisionEvent, ZoneProvisioner};

/// Entry point of the sync engine
pub struct SyncClient {
    resolver: IdentityResolver,
    provisioner: ZoneProvisioner,
    fetcher: ChangeFetcher,
    mutations: MutationClient,
    max_batch_size: usize,
    identity: RwLock<Option<RemoteIdentity>>,
    zone_id: RwLock<Option<ZoneId>>,
}

impl SyncClient {
    /// Builds a client over the given remote and identity store
    pub fn from_config(
        remote: Arc<dyn IRemoteStore>,
        identity_store: Arc<dyn IIdentityStore>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let provisioner = ZoneProvisioner::from_config(Arc::clone(&remote), &config.zone)
            .context("Invalid zone configuration")?;

        Ok(Self {
            resolver: IdentityResolver::new(Arc::clone(&remote), identity_store),
            provisioner,
            fetcher: ChangeFetcher::new(Arc::clone(&remote), config.fetch.results_limit),
            mutations: MutationClient::new(remote),
            max_batch_size: config.upload.max_batch_size,
            identity: RwLock::new(None),
            zone_id: RwLock::new(None),
        })
    }

    /// Builds a client talking HTTP to the configured remote
    ///
    /// The identity store is picked from `config.identity`.
    pub fn connect(config: &Config, api_token: impl Into<String>) -> anyhow::Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow::bail!("Invalid configuration: {}", details.join("; "));
        }

        let client = RemoteClient::new(api_token, &config.remote)?;
        let remote: Arc<dyn IRemoteStore> = Arc::new(HttpRemoteStore::new(client));
        let identity_store = open_identity_store(&config.identity);

        Self::from_config(remote, identity_store, config)
    }

    /// Reports provisioning progress to `sender`
    #[must_use]
    pub fn with_provision_events(mut self, sender: mpsc::UnboundedSender<ProvisionEvent>) -> Self {
        self.provisioner = self.provisioner.with_events(sender);
        self
    }

    /// Resolves the identity and provisions the zone
    ///
    /// Once both stages have finished, the zone id is recorded if zone
    /// creation released the subscription stage, and from then on the client
    /// counts as initialised. A subscription failure still initialises the
    /// client but is returned as the result.
    #[instrument(skip(self))]
    pub async fn initialise(&self) -> Result<ZoneId, SyncError> {
        let identity = self.resolver.resolve().await?;
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = Some(identity.clone());

        let outcome = self.provisioner.run(&identity).await;
        if outcome.subscription_dispatched() {
            *self.zone_id.write().unwrap_or_else(PoisonError::into_inner) =
                Some(outcome.zone_id.clone());
            info!(zone = %outcome.zone_id, "Sync client initialised");
        }

        outcome.into_result()
    }

    pub fn is_initialised(&self) -> bool {
        self.zone_id().is_some()
    }

    pub fn identity(&self) -> Option<RemoteIdentity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn zone_id(&self) -> Option<ZoneId> {
        self.zone_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Largest batch the host should pass to [`upload`](Self::upload) or [`remove`](Self::remove)
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn require_zone(&self) -> Result<ZoneId, SyncError> {
        self.zone_id().ok_or(SyncError::NotInitialised)
    }

    /// Fetches the zone's changes after `since` (all of them when `None`)
    #[instrument(skip(self))]
    pub async fn fetch_record_changes(
        &self,
        since: Option<&ChangeToken>,
    ) -> Result<ChangeCollection, SyncError> {
        let zone_id = self.require_zone()?;
        self.fetcher.fetch(&zone_id, since).await
    }

    /// Like [`fetch_record_changes`](Self::fetch_record_changes), streaming per-item events
    #[instrument(skip(self, events))]
    pub async fn fetch_record_changes_with_events(
        &self,
        since: Option<&ChangeToken>,
        events: &mpsc::UnboundedSender<FetchEvent>,
    ) -> Result<ChangeCollection, SyncError> {
        let zone_id = self.require_zone()?;
        self.fetcher.fetch_with_events(&zone_id, since, events).await
    }

    /// Uploads records with version checks; see [`MutationClient::upload`]
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn upload(&self, records: &[Record]) -> Result<Vec<Record>, SyncError> {
        let zone_id = self.require_zone()?;
        self.mutations.upload(&zone_id, records).await
    }

    /// Uploads records replacing whatever is stored
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn force_upload(&self, records: &[Record]) -> Result<Vec<Record>, SyncError> {
        let zone_id = self.require_zone()?;
        self.mutations.force_upload(&zone_id, records).await
    }

    /// Deletes records by identifier
    #[instrument(skip(self, record_ids), fields(count = record_ids.len()))]
    pub async fn remove(&self, record_ids: &[RecordId]) -> Result<(), SyncError> {
        let zone_id = self.require_zone()?;
        self.mutations.remove(&zone_id, record_ids).await
    }

    /// Forgets the cached identity and the zone
    ///
    /// Used when the account changes; the next `initialise` resolves again.
    #[instrument(skip(self))]
    pub fn reset_identity(&self) -> Result<(), SyncError> {
        self.resolver.clear()?;
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = None;
        *self.zone_id.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Sync client identity reset");
        Ok(())
    }
}

//! HttpRemoteStore - IRemoteStore implementation over the remote web service
//!
//! Wraps the [`RemoteClient`] and delegates to the identity, zones, changes
//! and records modules to fulfil the [`IRemoteStore`] port contract.
//!
//! ## Design Notes
//!
//! - Uses `tokio::sync::RwLock` because port methods take `&self` while
//!   replacing the API token needs `&mut RemoteClient`. Requests hold the read
//!   lock only for their own duration, so independent calls run concurrently.
//! - Creating a zone that already exists surfaces as
//!   [`RemoteError::AlreadyExists`]; the provisioner decides what that means.

use tokio::sync::RwLock;
use tracing::debug;

use zonesync_core::domain::newtypes::{ChangeToken, RemoteIdentity, ZoneId};
use zonesync_core::ports::{
    ChangePage, IRemoteStore, RecordOperation, RecordOutcome, RemoteError, ZoneSubscription,
};

use crate::client::RemoteClient;
use crate::{changes, identity, records, zones};

/// Remote store backed by the HTTP web service
pub struct HttpRemoteStore {
    client: RwLock<RemoteClient>,
}

impl HttpRemoteStore {
    /// Creates a new `HttpRemoteStore` wrapping the given [`RemoteClient`]
    pub fn new(client: RemoteClient) -> Self {
        Self {
            client: RwLock::new(client),
        }
    }

    /// Replaces the API token used for subsequent requests
    pub async fn set_api_token(&self, token: impl Into<String>) {
        self.client.write().await.set_api_token(token);
    }
}

#[async_trait::async_trait]
impl IRemoteStore for HttpRemoteStore {
    async fn fetch_current_identity(&self) -> Result<RemoteIdentity, RemoteError> {
        let client = self.client.read().await;
        debug!("HttpRemoteStore::fetch_current_identity");
        identity::fetch_current_identity(&client).await
    }

    async fn save_zone(&self, zone_id: &ZoneId) -> Result<(), RemoteError> {
        let client = self.client.read().await;
        debug!(zone = %zone_id, "HttpRemoteStore::save_zone");
        zones::save_zone(&client, zone_id).await
    }

    async fn save_subscription(&self, subscription: &ZoneSubscription) -> Result<(), RemoteError> {
        let client = self.client.read().await;
        debug!(
            subscription = %subscription.subscription_id,
            "HttpRemoteStore::save_subscription"
        );
        zones::save_subscription(&client, subscription).await
    }

    async fn fetch_zone_changes(
        &self,
        zone_id: &ZoneId,
        since: Option<&ChangeToken>,
        results_limit: u32,
    ) -> Result<ChangePage, RemoteError> {
        let client = self.client.read().await;
        debug!(zone = %zone_id, "HttpRemoteStore::fetch_zone_changes");
        changes::fetch_zone_changes(&client, zone_id, since, results_limit).await
    }

    async fn modify_records(
        &self,
        zone_id: &ZoneId,
        operations: &[RecordOperation],
    ) -> Result<Vec<RecordOutcome>, RemoteError> {
        let client = self.client.read().await;
        debug!(
            zone = %zone_id,
            operations = operations.len(),
            "HttpRemoteStore::modify_records"
        );
        records::modify_records(&client, zone_id, operations).await
    }
}

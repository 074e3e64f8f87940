//! Shared helpers for engine integration tests

use std::sync::Arc;

use zonesync_core::config::{Config, ConfigBuilder, IdentityStoreKind};
use zonesync_core::domain::newtypes::{RecordId, RemoteIdentity};
use zonesync_core::domain::{ChangeCollection, Record};
use zonesync_sync::{InMemoryRemoteStore, MemoryIdentityStore, SyncClient};

pub fn owner() -> RemoteIdentity {
    RemoteIdentity::new("_d41d8cd98f00b204e9800998ecf8427e".to_string()).unwrap()
}

pub fn id(name: &str) -> RecordId {
    RecordId::new(name.to_string()).unwrap()
}

/// A new, never-saved book record
pub fn book(name: &str, title: &str) -> Record {
    Record::new(id(name), "Book")
        .unwrap()
        .with_field("title", serde_json::json!(title))
}

/// Config with the given page size and an in-memory identity store
pub fn config(results_limit: u32) -> Config {
    ConfigBuilder::new()
        .fetch_results_limit(results_limit)
        .identity_store(IdentityStoreKind::Memory)
        .build()
}

pub fn remote() -> Arc<InMemoryRemoteStore> {
    Arc::new(InMemoryRemoteStore::new(owner()))
}

pub fn client(remote: &Arc<InMemoryRemoteStore>, config: &Config) -> SyncClient {
    SyncClient::from_config(remote.clone(), Arc::new(MemoryIdentityStore::new()), config).unwrap()
}

/// An initialised client over `remote`
pub async fn ready_client(remote: &Arc<InMemoryRemoteStore>, config: &Config) -> SyncClient {
    let client = client(remote, config);
    client.initialise().await.unwrap();
    client
}

/// Names of the changed records, in delivery order
pub fn changed_names(changes: &ChangeCollection) -> Vec<String> {
    changes
        .changed_records()
        .iter()
        .map(|r| r.id().to_string())
        .collect()
}

pub fn deleted_names(changes: &ChangeCollection) -> Vec<String> {
    changes
        .deleted_record_ids()
        .iter()
        .map(ToString::to_string)
        .collect()
}

//! ZoneSync Sync - Remote record synchronization engine
//!
//! Keeps a host's local records consistent with a zone of a remote,
//! multi-device record store:
//! - One-time identity resolution, cached in a host-chosen store
//! - Zone and silent change-subscription provisioning
//! - Incremental, token-resumed change fetching
//! - Version-checked batch uploads and batch deletes
//!
//! ## Modules
//!
//! - [`client`] - [`SyncClient`], the facade hosts use
//! - [`identity`] - Identity resolution over [`IIdentityStore`](zonesync_core::ports::IIdentityStore)
//! - [`provisioner`] - Zone then subscription pipeline
//! - [`fetcher`] - Paginated change fetch into a `ChangeCollection`
//! - [`mutation`] - Upload and delete batches
//! - [`memory`] - In-process remote store for tests and offline hosts
//! - [`identity_store`] - Memory, file and keyring identity stores
//! - [`logging`] - Tracing subscriber setup

pub mod client;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod identity_store;
pub mod logging;
pub mod memory;
pub mod mutation;
pub mod provisioner;

pub use client::SyncClient;
pub use error::SyncError;
pub use fetcher::{ChangeFetcher, FetchEvent};
pub use identity::IdentityResolver;
pub use identity_store::{open_identity_store, FileIdentityStore, MemoryIdentityStore};
pub use memory::InMemoryRemoteStore;
pub use mutation::MutationClient;
pub use provisioner::{ProvisionEvent, ProvisionOutcome, ZoneProvisioner};
